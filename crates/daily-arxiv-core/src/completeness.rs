use crate::record::{Field, PaperRecord};

/// Fields a harvested record must carry before it is published without fallback.
pub const REQUIRED_FIELDS: [Field; 4] = [
    Field::Authors,
    Field::Title,
    Field::Categories,
    Field::Summary,
];

/// Decides whether a record needs the metadata fallback.
#[derive(Debug, Clone)]
pub struct CompletenessPolicy {
    required: Vec<Field>,
    fallback_enabled: bool,
}

impl CompletenessPolicy {
    pub fn new(fallback_enabled: bool) -> Self {
        Self::with_required(REQUIRED_FIELDS.to_vec(), fallback_enabled)
    }

    pub fn with_required(required: Vec<Field>, fallback_enabled: bool) -> Self {
        Self {
            required,
            fallback_enabled,
        }
    }

    pub fn is_missing(record: &PaperRecord, field: Field) -> bool {
        record.field(field).is_missing()
    }

    pub fn missing_fields(&self, record: &PaperRecord) -> Vec<Field> {
        self.required
            .iter()
            .copied()
            .filter(|field| Self::is_missing(record, *field))
            .collect()
    }

    /// True when fallback is enabled and at least one required field is missing.
    pub fn needs_fallback(&self, record: &PaperRecord) -> bool {
        self.fallback_enabled
            && self
                .required
                .iter()
                .any(|field| Self::is_missing(record, *field))
    }
}

impl Default for CompletenessPolicy {
    fn default() -> Self {
        Self::new(false)
    }
}
