//! Capture facts read from the EXIF container
//!
//! Every field is looked up by tag and defaults on its own: a missing or
//! malformed tag never hides the others, and a missing container leaves
//! all of them empty.

use chrono::{NaiveDateTime, TimeZone, Utc};
use exif::{Exif, Field, In, Reader, Tag, Value};
use std::io::Cursor;
use std::str::from_utf8;
use tracing::debug;

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureFields {
    pub model: Option<String>,
    pub exposure_program: Option<u32>,
    /// `"num/den"` as stored
    pub f_number: Option<String>,
    pub iso: Option<u32>,
    /// `"num/den"` as stored, e.g. `"1/250"`
    pub exposure_time: Option<String>,
    /// `"num/den"` as stored
    pub focal_length: Option<String>,
    pub lens_model: Option<String>,
    pub captured_at: Option<NaiveDateTime>,
}

impl CaptureFields {
    /// Read the EXIF container of an image file
    pub fn read(data: &[u8]) -> Self {
        match Reader::new().read_from_container(&mut Cursor::new(data)) {
            Ok(exif) => Self::from_exif(&exif),
            Err(e) => {
                debug!(error = %e, "No readable EXIF container");
                Self::default()
            }
        }
    }

    pub fn from_exif(exif: &Exif) -> Self {
        let field = |tag: Tag| exif.get_field(tag, In::PRIMARY);

        Self {
            model: field(Tag::Model).and_then(ascii),
            exposure_program: field(Tag::ExposureProgram).and_then(|f| f.value.get_uint(0)),
            f_number: field(Tag::FNumber).and_then(rational),
            iso: field(Tag::PhotographicSensitivity).and_then(|f| f.value.get_uint(0)),
            exposure_time: field(Tag::ExposureTime).and_then(rational),
            focal_length: field(Tag::FocalLength).and_then(rational),
            lens_model: field(Tag::LensModel).and_then(ascii),
            captured_at: field(Tag::DateTimeOriginal)
                .and_then(datetime)
                .or_else(|| field(Tag::DateTime).and_then(datetime)),
        }
    }

    /// Capture time as Unix seconds, 0 when unknown
    pub fn timestamp(&self) -> i64 {
        self.captured_at
            .map(|at| Utc.from_utc_datetime(&at).timestamp())
            .unwrap_or(0)
    }
}

/// Label of an EXIF exposure-program code
pub fn exposure_mode(code: Option<u32>) -> &'static str {
    match code {
        Some(0) => "Manual",
        Some(1) => "Program",
        Some(2) => "Aperture Priority",
        Some(3) => "Shutter Priority",
        Some(4) => "Creative",
        Some(5) => "Action",
        Some(6) => "Portrait",
        Some(7) => "Landscape",
        _ => "Unknown",
    }
}

/// `"n/d"` as `n / d`; anything else, or `d == 0`, is `0.0`
pub fn parse_rational(raw: &str) -> f32 {
    let Some((num, den)) = raw.split_once('/') else {
        return 0.0;
    };
    match (num.trim().parse::<f64>(), den.trim().parse::<f64>()) {
        (Ok(num), Ok(den)) if den != 0.0 => (num / den) as f32,
        _ => 0.0,
    }
}

fn ascii(field: &Field) -> Option<String> {
    match &field.value {
        Value::Ascii(parts) => {
            let first = parts.first()?;
            let text = from_utf8(first).ok()?.trim_matches(char::from(0)).trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        _ => None,
    }
}

fn rational(field: &Field) -> Option<String> {
    match &field.value {
        Value::Rational(values) => values.first().map(|r| format!("{}/{}", r.num, r.denom)),
        Value::SRational(values) => values.first().map(|r| format!("{}/{}", r.num, r.denom)),
        _ => None,
    }
}

fn datetime(field: &Field) -> Option<NaiveDateTime> {
    let raw = ascii(field)?;
    NaiveDateTime::parse_from_str(&raw, EXIF_DATETIME_FORMAT)
        .map_err(|e| debug!(tag = %field.tag, value = %raw, error = %e, "Unparsable EXIF date"))
        .ok()
}
