// SPDX-License-Identifier: GPL-3.0-only

//! Parsed smartctl reports
//!
//! smartctl emits differently shaped documents for ATA and NVMe devices and
//! carries no field naming the shape. The dialect is decided once, when the
//! report is built, from the presence of the top-level `ata_smart_data` key.

use serde_json::Value;

/// Shape of a smartctl report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDialect {
    /// Classic ATA/SATA drives, keyed under `ata_smart_data`
    Ata,
    /// NVMe devices, keyed under `nvme_*`. Any report without ATA data is
    /// read this way; NVMe lookups fall back to defaults when absent.
    Nvme,
}

impl ReportDialect {
    pub fn detect(document: &Value) -> Self {
        if document.get("ata_smart_data").is_some() {
            Self::Ata
        } else {
            Self::Nvme
        }
    }
}

/// One device's `smartctl --xall --json` document
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticReport {
    document: Value,
    dialect: ReportDialect,
}

impl DiagnosticReport {
    pub fn new(document: Value) -> Self {
        let dialect = ReportDialect::detect(&document);
        Self { document, dialect }
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text).map(Self::new)
    }

    pub fn dialect(&self) -> ReportDialect {
        self.dialect
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Value at a JSON pointer (e.g. `/smart_status/passed`), if every
    /// level of the path exists.
    pub fn field(&self, pointer: &str) -> Option<&Value> {
        self.document.pointer(pointer)
    }

    pub fn str_field(&self, pointer: &str) -> Option<&str> {
        self.field(pointer)?.as_str()
    }

    pub fn bool_field(&self, pointer: &str) -> Option<bool> {
        self.field(pointer)?.as_bool()
    }

    pub fn i64_field(&self, pointer: &str) -> Option<i64> {
        self.field(pointer)?.as_i64()
    }

    pub fn f64_field(&self, pointer: &str) -> Option<f64> {
        self.field(pointer)?.as_f64()
    }

    pub fn array_field(&self, pointer: &str) -> Option<&[Value]> {
        self.field(pointer)?.as_array().map(Vec::as_slice)
    }
}

impl From<Value> for DiagnosticReport {
    fn from(document: Value) -> Self {
        Self::new(document)
    }
}
