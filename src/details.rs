//! Delimited-text encoding of per-domain certificate details.
//!
//! Each domain can have multiple certificates that failed to refresh. They
//! are packed into one string, entries separated by `|`:
//!
//! ```text
//! certificateRecords := <certificate-entry>[|<certificate-entry>]*
//! certificate-entry  := <service>;<provider>;<instanceId>;<issueTime>;<expiryTime>;<hostName>
//! ```
//!
//! Empty values still occupy their `;`-separated position, so decoding
//! always recovers exactly six fields per entry. Delimiter characters are
//! stripped from field values at encode time; that is the only sanitization
//! the format needs.

use crate::error::DetailsError;
use crate::record::{format_timestamp, CertRecord};
use serde::Serialize;

/// Separator between certificate entries.
pub const ENTRY_SEPARATOR: char = '|';
/// Separator between the fields of one entry.
pub const FIELD_SEPARATOR: char = ';';
/// Number of fields in every entry.
pub const ENTRY_FIELD_COUNT: usize = 6;

/// The two-entry details mapping carried by a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDetails {
    pub domain: String,
    pub unrefreshed_certs: String,
}

impl EncodedDetails {
    /// Encode a domain's record group. Pure and total: an empty record list
    /// encodes to the empty string (zero entries). Entries keep input order
    /// and the result never has a leading or trailing `|`.
    pub fn encode(domain: &str, records: &[CertRecord]) -> Self {
        let mut out = String::with_capacity(records.len() * 64);
        for record in records {
            if !out.is_empty() {
                out.push(ENTRY_SEPARATOR);
            }
            push_field(&mut out, record.service_short_name());
            out.push(FIELD_SEPARATOR);
            push_field(&mut out, &record.provider);
            out.push(FIELD_SEPARATOR);
            push_field(&mut out, &record.instance_id);
            out.push(FIELD_SEPARATOR);
            push_field(&mut out, &format_timestamp(record.issue_time));
            out.push(FIELD_SEPARATOR);
            push_field(&mut out, &format_timestamp(record.expiry_time));
            out.push(FIELD_SEPARATOR);
            push_field(&mut out, record.host_name.as_deref().unwrap_or(""));
        }
        Self {
            domain: domain.to_string(),
            unrefreshed_certs: out,
        }
    }

    /// Number of entries packed into this details string.
    pub fn entry_count(&self) -> usize {
        entry_count(&self.unrefreshed_certs)
    }

    /// Decode the packed entries back into structured form.
    pub fn decode_entries(&self) -> Result<Vec<CertDetailEntry>, DetailsError> {
        decode(&self.unrefreshed_certs)
    }
}

/// Append a field value, dropping delimiter characters so every field keeps
/// its position in the entry.
fn push_field(out: &mut String, value: &str) {
    out.extend(
        value
            .chars()
            .filter(|c| *c != ENTRY_SEPARATOR && *c != FIELD_SEPARATOR),
    );
}

/// Entry-count formula: occurrences of `|` plus one.
pub fn entry_count(encoded: &str) -> usize {
    encoded.chars().filter(|c| *c == ENTRY_SEPARATOR).count() + 1
}

/// One decoded certificate entry. Field values are the encoded strings;
/// absent values are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertDetailEntry {
    pub service: String,
    pub provider: String,
    pub instance_id: String,
    pub issue_time: String,
    pub expiry_time: String,
    pub host_name: String,
}

/// Split a packed details string back into entries.
///
/// The empty string decodes to zero entries.
///
/// # Errors
/// Returns [`DetailsError::MalformedEntry`] if any entry does not have
/// exactly [`ENTRY_FIELD_COUNT`] fields.
pub fn decode(encoded: &str) -> Result<Vec<CertDetailEntry>, DetailsError> {
    if encoded.is_empty() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for (index, entry) in encoded.split(ENTRY_SEPARATOR).enumerate() {
        let fields: Vec<&str> = entry.split(FIELD_SEPARATOR).collect();
        if fields.len() != ENTRY_FIELD_COUNT {
            return Err(DetailsError::MalformedEntry {
                index,
                fields: fields.len(),
            });
        }
        entries.push(CertDetailEntry {
            service: fields[0].to_string(),
            provider: fields[1].to_string(),
            instance_id: fields[2].to_string(),
            issue_time: fields[3].to_string(),
            expiry_time: fields[4].to_string(),
            host_name: fields[5].to_string(),
        });
    }
    Ok(entries)
}
