use serde_json::{Map, Value, json};

use crate::error::FieldTypeError;
use crate::traits::{FieldType, RenderOptions, TypeCategory, render_raw};

/// Accepted URL shapes for link/file/image values. Relative paths are fine;
/// anything else must be an explicit http(s) or mailto URL.
fn check_url(url: &str, key: &str) -> Result<(), FieldTypeError> {
    let ok = url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("mailto:")
        || url.starts_with('/');
    if url.is_empty() || !ok {
        return Err(FieldTypeError::InvalidValue(format!(
            "{key} expects an http(s), mailto or site-relative url, got '{url}'"
        )));
    }
    Ok(())
}

/// Copy the allowed keys of an object value, requiring `url`.
fn normalize_asset(
    raw: &Value,
    key: &str,
    allowed: &[&str],
) -> Result<Value, FieldTypeError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| FieldTypeError::InvalidValue(format!("{key} expects an object value")))?;
    let url = obj
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| FieldTypeError::InvalidValue(format!("{key} requires a 'url'")))?;
    check_url(url, key)?;

    let mut out = Map::new();
    out.insert("url".into(), Value::String(url.to_string()));
    for k in allowed {
        if let Some(v) = obj.get(*k) {
            out.insert((*k).to_string(), v.clone());
        }
    }
    Ok(Value::Object(out))
}

pub struct LinkType;

impl FieldType for LinkType {
    fn key(&self) -> &str {
        "link"
    }

    fn label(&self) -> &str {
        "Link"
    }

    fn icon(&self) -> &str {
        "link"
    }

    fn category(&self) -> TypeCategory {
        TypeCategory::Content
    }

    fn normalize(&self, raw: &Value, _config: &Value) -> Result<Value, FieldTypeError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        // A bare string is shorthand for { url }.
        if let Some(url) = raw.as_str() {
            check_url(url, self.key())?;
            return Ok(json!({ "url": url }));
        }
        normalize_asset(raw, self.key(), &["label", "target"])
    }

    fn render(&self, value: &Value, _config: &Value, _opts: &RenderOptions) -> String {
        value
            .get("label")
            .or_else(|| value.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| render_raw(value))
    }
}

pub struct FileType;

impl FieldType for FileType {
    fn key(&self) -> &str {
        "file"
    }

    fn label(&self) -> &str {
        "File"
    }

    fn icon(&self) -> &str {
        "file"
    }

    fn category(&self) -> TypeCategory {
        TypeCategory::Content
    }

    fn normalize(&self, raw: &Value, _config: &Value) -> Result<Value, FieldTypeError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        normalize_asset(raw, self.key(), &["filename", "mime", "size"])
    }

    fn render(&self, value: &Value, _config: &Value, _opts: &RenderOptions) -> String {
        value
            .get("filename")
            .or_else(|| value.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| render_raw(value))
    }
}

pub struct ImageType;

impl ImageType {
    fn normalize_one(raw: &Value) -> Result<Value, FieldTypeError> {
        normalize_asset(raw, "image", &["alt", "width", "height"])
    }
}

impl FieldType for ImageType {
    fn key(&self) -> &str {
        "image"
    }

    fn label(&self) -> &str {
        "Image"
    }

    fn icon(&self) -> &str {
        "image"
    }

    fn category(&self) -> TypeCategory {
        TypeCategory::Content
    }

    fn normalize(&self, raw: &Value, _config: &Value) -> Result<Value, FieldTypeError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        Self::normalize_one(raw)
    }

    fn render(&self, value: &Value, _config: &Value, _opts: &RenderOptions) -> String {
        value
            .get("url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| render_raw(value))
    }
}

/// Ordered list of images.
pub struct GalleryType;

impl FieldType for GalleryType {
    fn key(&self) -> &str {
        "gallery"
    }

    fn label(&self) -> &str {
        "Gallery"
    }

    fn icon(&self) -> &str {
        "images"
    }

    fn category(&self) -> TypeCategory {
        TypeCategory::Content
    }

    fn normalize(&self, raw: &Value, _config: &Value) -> Result<Value, FieldTypeError> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        let items = raw
            .as_array()
            .ok_or_else(|| FieldTypeError::InvalidValue("gallery expects an array".into()))?;
        let normalized = items
            .iter()
            .map(ImageType::normalize_one)
            .collect::<Result<Vec<Value>, _>>()?;
        Ok(Value::Array(normalized))
    }

    fn render(&self, value: &Value, _config: &Value, opts: &RenderOptions) -> String {
        match value.as_array() {
            Some(items) => items
                .iter()
                .filter_map(|i| i.get("url").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(opts.separator()),
            None => render_raw(value),
        }
    }
}
