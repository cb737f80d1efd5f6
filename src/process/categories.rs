use anyhow::Result;

use crate::error::EtlError;
use crate::process::utils::{strip_value_suffix, trailing_digit};

/// Separator between `label-digit` entries in a packed string.
pub const FIELD_SEPARATOR: char = ';';

/// Ordered category label names, decided once from a single packed string
/// and applied to every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryLabels {
    labels: Vec<String>,
}

impl CategoryLabels {
    /// Derive labels from a sample like `related-1;request-0;offer-0`.
    pub fn from_sample(packed: &str) -> Self {
        let labels = packed
            .split(FIELD_SEPARATOR)
            .map(|field| strip_value_suffix(field).to_string())
            .collect();
        Self { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Whether `packed` carries exactly these labels in this order.
    pub fn matches(&self, packed: &str) -> bool {
        let mut fields = packed.split(FIELD_SEPARATOR);
        self.labels
            .iter()
            .all(|label| fields.next().map(strip_value_suffix) == Some(label.as_str()))
            && fields.next().is_none()
    }
}

/// Decode one packed string into its per-label digit values.
///
/// Values are positional: the i-th field is taken to be `labels[i]` whatever
/// its own label text says. `row` (position in the merged table) and `id`
/// only feed error messages.
pub fn decode_packed(
    packed: &str,
    labels: &CategoryLabels,
    row: usize,
    id: i64,
) -> Result<Vec<i64>> {
    let fields: Vec<&str> = packed.split(FIELD_SEPARATOR).collect();
    if fields.len() != labels.len() {
        return Err(EtlError::SchemaMismatch {
            row,
            id,
            expected: labels.len(),
            found: fields.len(),
        }
        .into());
    }

    fields
        .into_iter()
        .map(|field| {
            trailing_digit(field).ok_or_else(|| {
                anyhow::Error::from(EtlError::InvalidCategoryValue {
                    row,
                    id,
                    field: field.to_string(),
                })
            })
        })
        .collect()
}
