use crate::aggregate::{AttendanceSettings, FeeSettings, SortDir};
use crate::identity::{
    IdentitySettings, DEFAULT_PAD_CHAR, DEFAULT_PASSWORD_LEN, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN,
};
use anyhow::{anyhow, Context};
use serde_json::{json, Map, Value};
use std::path::Path;

pub const OVERRIDES_ENV: &str = "SCHOOLDESKD_SETUP";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupSection {
    Identity,
    Attendance,
    Fees,
    Analysis,
}

impl SetupSection {
    pub const ALL: [SetupSection; 4] = [
        SetupSection::Identity,
        SetupSection::Attendance,
        SetupSection::Fees,
        SetupSection::Analysis,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "identity" => Some(Self::Identity),
            "attendance" => Some(Self::Attendance),
            "fees" => Some(Self::Fees),
            "analysis" => Some(Self::Analysis),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Attendance => "attendance",
            Self::Fees => "fees",
            Self::Analysis => "analysis",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Identity => json!({
            "usernamePadChar": DEFAULT_PAD_CHAR.to_string(),
            "passwordLength": DEFAULT_PASSWORD_LEN
        }),
        SetupSection::Attendance => json!({
            "knownStatuses": ["present", "absent", "late", "excused"],
            "presentStatuses": ["present", "late", "excused"]
        }),
        SetupSection::Fees => json!({
            "knownStatuses": ["paid", "pending", "overdue"],
            "amountField": "amount",
            "paidField": "paid"
        }),
        SetupSection::Analysis => json!({
            "defaultTopCount": 5,
            "defaultSortDir": "desc"
        }),
    }
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    if s.len() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn parse_status_list(v: &Value, key: &str) -> Result<Value, String> {
    let items = v
        .as_array()
        .ok_or_else(|| format!("{} must be an array of strings", key))?;
    if items.is_empty() || items.len() > 12 {
        return Err(format!("{} must hold 1..=12 statuses", key));
    }
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let s = parse_string_max(item, key, 24)?.to_lowercase();
        if !out.contains(&s) {
            out.push(s);
        }
    }
    Ok(json!(out))
}

fn parse_pad_char(v: &Value, key: &str) -> Result<String, String> {
    let s = parse_string_max(v, key, 4)?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_digit() || c.is_ascii_lowercase() => Ok(c.to_string()),
        _ => Err(format!("{} must be a single digit or lowercase letter", key)),
    }
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = current
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())?;
    for (k, v) in patch {
        match section {
            SetupSection::Identity => match k.as_str() {
                "usernamePadChar" => {
                    obj.insert(k.clone(), Value::String(parse_pad_char(v, k)?));
                }
                "passwordLength" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(
                        v,
                        k,
                        MIN_PASSWORD_LEN as i64,
                        MAX_PASSWORD_LEN as i64,
                    )?));
                }
                _ => return Err(format!("unknown identity field: {}", k)),
            },
            SetupSection::Attendance => match k.as_str() {
                "knownStatuses" | "presentStatuses" => {
                    obj.insert(k.clone(), parse_status_list(v, k)?);
                }
                _ => return Err(format!("unknown attendance field: {}", k)),
            },
            SetupSection::Fees => match k.as_str() {
                "knownStatuses" => {
                    obj.insert(k.clone(), parse_status_list(v, k)?);
                }
                "amountField" | "paidField" => {
                    obj.insert(k.clone(), Value::String(parse_string_max(v, k, 40)?));
                }
                _ => return Err(format!("unknown fees field: {}", k)),
            },
            SetupSection::Analysis => match k.as_str() {
                "defaultTopCount" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 1, 100)?));
                }
                "defaultSortDir" => {
                    let s = parse_string_max(v, k, 8)?;
                    let Some(dir) = SortDir::parse(&s) else {
                        return Err("defaultSortDir must be one of: asc, desc".into());
                    };
                    obj.insert(k.clone(), Value::String(dir.as_str().to_string()));
                }
                _ => return Err(format!("unknown analysis field: {}", k)),
            },
        }
    }
    Ok(())
}

fn string_list(section: &Value, key: &str) -> Vec<String> {
    section
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Process-lifetime configuration. Nothing here is written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Setup {
    identity: Value,
    attendance: Value,
    fees: Value,
    analysis: Value,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            identity: default_section(SetupSection::Identity),
            attendance: default_section(SetupSection::Attendance),
            fees: default_section(SetupSection::Fees),
            analysis: default_section(SetupSection::Analysis),
        }
    }
}

impl Setup {
    pub fn section(&self, section: SetupSection) -> &Value {
        match section {
            SetupSection::Identity => &self.identity,
            SetupSection::Attendance => &self.attendance,
            SetupSection::Fees => &self.fees,
            SetupSection::Analysis => &self.analysis,
        }
    }

    fn section_mut(&mut self, section: SetupSection) -> &mut Value {
        match section {
            SetupSection::Identity => &mut self.identity,
            SetupSection::Attendance => &mut self.attendance,
            SetupSection::Fees => &mut self.fees,
            SetupSection::Analysis => &mut self.analysis,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for section in SetupSection::ALL {
            out.insert(section.key().to_string(), self.section(section).clone());
        }
        Value::Object(out)
    }

    /// Validates the whole patch before any field lands.
    pub fn update(
        &mut self,
        section: SetupSection,
        patch: &Map<String, Value>,
    ) -> Result<(), String> {
        let mut next = self.section(section).clone();
        merge_section_patch(section, &mut next, patch)?;
        *self.section_mut(section) = next;
        Ok(())
    }

    /// Applies a `{ "<section>": { ...patch } }` JSON file.
    pub fn apply_overrides_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read setup overrides {}", path.display()))?;
        let raw: Value = serde_json::from_str(&text)
            .with_context(|| format!("parse setup overrides {}", path.display()))?;
        let obj = raw
            .as_object()
            .ok_or_else(|| anyhow!("setup overrides must be a JSON object"))?;

        let mut next = self.clone();
        for (name, patch) in obj {
            let section = SetupSection::parse(name)
                .ok_or_else(|| anyhow!("unknown setup section: {}", name))?;
            let patch = patch
                .as_object()
                .ok_or_else(|| anyhow!("setup overrides for {} must be an object", name))?;
            next.update(section, patch)
                .map_err(|msg| anyhow!("setup overrides for {}: {}", name, msg))?;
        }
        *self = next;
        Ok(())
    }

    pub fn identity(&self) -> IdentitySettings {
        let defaults = IdentitySettings::default();
        IdentitySettings {
            pad_char: self
                .identity
                .get("usernamePadChar")
                .and_then(|v| v.as_str())
                .and_then(|s| s.chars().next())
                .unwrap_or(defaults.pad_char),
            password_length: self
                .identity
                .get("passwordLength")
                .and_then(|v| v.as_u64())
                .map(|n| n as usize)
                .unwrap_or(defaults.password_length),
        }
    }

    pub fn attendance(&self) -> AttendanceSettings {
        AttendanceSettings {
            known_statuses: string_list(&self.attendance, "knownStatuses"),
            present_statuses: string_list(&self.attendance, "presentStatuses"),
        }
    }

    pub fn fees(&self) -> FeeSettings {
        let defaults = FeeSettings::default();
        let field = |key: &str, fallback: String| {
            self.fees
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or(fallback)
        };
        FeeSettings {
            known_statuses: string_list(&self.fees, "knownStatuses"),
            amount_field: field("amountField", defaults.amount_field),
            paid_field: field("paidField", defaults.paid_field),
        }
    }

    pub fn default_top_count(&self) -> usize {
        self.analysis
            .get("defaultTopCount")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(5)
    }

    pub fn default_sort_dir(&self) -> SortDir {
        self.analysis
            .get("defaultSortDir")
            .and_then(|v| v.as_str())
            .and_then(SortDir::parse)
            .unwrap_or(SortDir::Desc)
    }
}
