//! Drug catalog models.
//!
//! [`RawDrugData`] mirrors what the catalog page hands back, internal sort keys
//! and slugs included. [`DrugRecord`] is the consumer-facing shape and has no
//! place to hold those fields, so converting one into the other strips them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Drug data exactly as returned by a catalog lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawDrugData {
    /// Equivalent drugs keyed by display name (brand and generic variants)
    #[serde(default)]
    pub equivalent_drugs: BTreeMap<String, RawEquivalentDrug>,
}

/// One equivalent drug as the catalog stores it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawEquivalentDrug {
    /// URL slug (catalog-internal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<Value>,
    /// Ordering hint for forms (catalog-internal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_sort: Option<Value>,
    /// Default days supply used by the pricing page (catalog-internal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_days_supply: Option<Value>,
    /// Dosage forms keyed by form name
    #[serde(default)]
    pub forms: BTreeMap<String, RawDosageForm>,
    /// Everything else the catalog reports
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// One dosage form as the catalog stores it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawDosageForm {
    /// Ordering hint for dosages (catalog-internal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage_sort: Option<Value>,
    /// Everything else: dosages, quantities, display labels
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Validated drug data with catalog-internal fields removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DrugRecord {
    /// Equivalent drugs keyed by display name
    #[serde(default)]
    pub equivalent_drugs: BTreeMap<String, EquivalentDrug>,
}

/// A reduced equivalent-drug entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EquivalentDrug {
    /// Dosage forms keyed by form name (e.g. "tablet", "capsule")
    #[serde(default)]
    pub forms: BTreeMap<String, DosageForm>,
    /// Remaining display attributes
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A reduced dosage form entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DosageForm {
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl From<RawDosageForm> for DosageForm {
    fn from(raw: RawDosageForm) -> Self {
        Self {
            attributes: raw.attributes,
        }
    }
}

impl From<RawEquivalentDrug> for EquivalentDrug {
    fn from(raw: RawEquivalentDrug) -> Self {
        Self {
            forms: raw
                .forms
                .into_iter()
                .map(|(name, form)| (name, form.into()))
                .collect(),
            attributes: raw.attributes,
        }
    }
}

impl From<RawDrugData> for DrugRecord {
    fn from(raw: RawDrugData) -> Self {
        Self {
            equivalent_drugs: raw
                .equivalent_drugs
                .into_iter()
                .map(|(name, drug)| (name, drug.into()))
                .collect(),
        }
    }
}

impl RawDrugData {
    /// Parse a catalog payload (the JSON object embedded in the drug page).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl DrugRecord {
    /// Names of all equivalent drugs in this record.
    pub fn drug_names(&self) -> impl Iterator<Item = &str> {
        self.equivalent_drugs.keys().map(String::as_str)
    }

    /// Check whether the catalog reported no equivalents at all.
    pub fn is_empty(&self) -> bool {
        self.equivalent_drugs.is_empty()
    }

    /// Look up an equivalent drug by name, ignoring case.
    pub fn equivalent(&self, name: &str) -> Option<&EquivalentDrug> {
        let lower = name.to_lowercase();
        self.equivalent_drugs
            .iter()
            .find(|(key, _)| key.to_lowercase() == lower)
            .map(|(_, drug)| drug)
    }

    /// Serialize for hosts that consume plain JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl EquivalentDrug {
    /// Names of the available dosage forms.
    pub fn form_names(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }
}
