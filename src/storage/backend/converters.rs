//! Conversions between SeaORM models and domain types.

use std::collections::HashMap;

use sea_orm::ActiveValue::Set;
use serde_json::Value;

use crate::storage::models::{Click, ProcessedFile, ProcessingStatus, QrCode};

use migration::entities::{click, processed_file, qr_code};

pub fn model_to_qr_code(model: qr_code::Model) -> QrCode {
    let options: HashMap<String, Value> = match model.options {
        Value::Object(map) => map.into_iter().collect(),
        _ => HashMap::new(),
    };

    QrCode {
        id: model.id,
        slug: model.slug,
        title: model.title,
        content: model.content,
        is_dynamic: model.is_dynamic,
        options,
        created_at: model.created_at,
        updated_at: model.updated_at,
        click_count: 0,
    }
}

pub fn options_to_json(options: &HashMap<String, Value>) -> Value {
    Value::Object(options.clone().into_iter().collect())
}

pub fn model_to_click(model: click::Model) -> Click {
    Click {
        id: model.id,
        qrcode_id: model.qrcode_id,
        timestamp: model.timestamp,
        ip: model.ip,
        user_agent: model.user_agent,
        country: model.country,
    }
}

pub fn model_to_processed_file(model: processed_file::Model) -> ProcessedFile {
    let status = model
        .status
        .parse()
        .unwrap_or(ProcessingStatus::Error);

    ProcessedFile {
        dropbox_path: model.dropbox_path,
        filename: model.filename,
        content_hash: model.content_hash,
        qrcode_id: model.qrcode_id,
        status,
        error_message: model.error_message,
        updated_at: model.updated_at,
    }
}

pub fn processed_file_to_active_model(entry: &ProcessedFile) -> processed_file::ActiveModel {
    processed_file::ActiveModel {
        dropbox_path: Set(entry.dropbox_path.clone()),
        filename: Set(entry.filename.clone()),
        content_hash: Set(entry.content_hash.clone()),
        qrcode_id: Set(entry.qrcode_id),
        status: Set(entry.status.as_str().to_string()),
        error_message: Set(entry.error_message.clone()),
        updated_at: Set(entry.updated_at),
    }
}
