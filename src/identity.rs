use chrono::{DateTime, Datelike, Local, SecondsFormat, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

pub const USERNAME_LEN: usize = 6;
const USERNAME_PART_LEN: usize = 3;
const REFERENCE_SUFFIX_RANGE: u32 = 10_000;
pub const DEFAULT_PAD_CHAR: char = '0';
pub const DEFAULT_PASSWORD_LEN: usize = 6;
pub const MIN_PASSWORD_LEN: usize = 4;
pub const MAX_PASSWORD_LEN: usize = 64;

/// Knobs the `identity` setup section controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentitySettings {
    pub pad_char: char,
    pub password_length: usize,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            pad_char: DEFAULT_PAD_CHAR,
            password_length: DEFAULT_PASSWORD_LEN,
        }
    }
}

/// Form text: strings as-is, numbers and booleans stringified, anything else
/// becomes `""`.
pub fn coerce_form_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn form_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_form_text(&Value::deserialize(deserializer)?))
}

/// Like `form_text`, but blank values read as unset.
fn form_text_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = coerce_form_text(&Value::deserialize(deserializer)?);
    Ok(if text.trim().is_empty() { None } else { Some(text) })
}

/// Arrays keep their non-blank items; a single string is split on commas.
fn form_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .iter()
            .map(coerce_form_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        other => split_list(&coerce_form_text(&other)),
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameParts {
    #[serde(default, deserialize_with = "form_text")]
    pub first_name: String,
    #[serde(
        default,
        deserialize_with = "form_text_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub middle_name: Option<String>,
    #[serde(default, deserialize_with = "form_text")]
    pub last_name: String,
}

fn normalize_name_part(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect()
}

/// Up to three letters of each name part, right-padded with `pad` to six
/// characters.
///
/// Returns an empty string when either part has no letters left after
/// normalisation; the form layer reads that as "name still incomplete".
pub fn generate_username(first_name: &str, last_name: &str, pad: char) -> String {
    let first = normalize_name_part(first_name);
    let last = normalize_name_part(last_name);
    if first.is_empty() || last.is_empty() {
        return String::new();
    }

    let mut out: String = first
        .chars()
        .take(USERNAME_PART_LEN)
        .chain(last.chars().take(USERNAME_PART_LEN))
        .collect();
    let used = out.chars().count();
    out.extend(std::iter::repeat(pad).take(USERNAME_LEN.saturating_sub(used)));
    out
}

pub fn current_year() -> i32 {
    Local::now().year()
}

pub fn generate_reference_id() -> String {
    generate_reference_id_with(&mut rand::thread_rng(), current_year())
}

/// Four-digit year followed by a zero-padded random suffix in `0000..=9999`.
pub fn generate_reference_id_with<R: Rng>(rng: &mut R, year: i32) -> String {
    let suffix = rng.gen_range(0..REFERENCE_SUFFIX_RANGE);
    format!("{:04}{:04}", year.clamp(0, 9999), suffix)
}

pub fn generate_password(length: usize) -> String {
    generate_password_with(&mut rand::thread_rng(), length)
}

pub fn generate_password_with<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

/// Fills `slot` from `generate` only when it is unset or blank.
///
/// Returns whether a value was generated.
pub fn ensure_generated<F>(slot: &mut Option<String>, generate: F) -> bool
where
    F: FnOnce() -> String,
{
    let unset = slot.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true);
    if unset {
        *slot = Some(generate());
    }
    unset
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonKind {
    Student,
    Teacher,
    Staff,
}

impl PersonKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Self::Student),
            "teacher" => Some(Self::Teacher),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Staff => "staff",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "personType", rename_all = "camelCase")]
pub enum PersonDetails {
    #[serde(rename_all = "camelCase")]
    Student {
        #[serde(default, deserialize_with = "form_text")]
        class_id: String,
        #[serde(default, deserialize_with = "form_text")]
        level_id: String,
        #[serde(default, deserialize_with = "form_text")]
        guardian_name: String,
    },
    #[serde(rename_all = "camelCase")]
    Teacher {
        #[serde(default, deserialize_with = "form_text")]
        department: String,
        #[serde(default, deserialize_with = "form_list")]
        subjects: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Staff {
        #[serde(default, deserialize_with = "form_text")]
        role: String,
    },
}

impl PersonDetails {
    pub fn empty(kind: PersonKind) -> Self {
        match kind {
            PersonKind::Student => Self::Student {
                class_id: String::new(),
                level_id: String::new(),
                guardian_name: String::new(),
            },
            PersonKind::Teacher => Self::Teacher {
                department: String::new(),
                subjects: Vec::new(),
            },
            PersonKind::Staff => Self::Staff {
                role: String::new(),
            },
        }
    }

    pub fn kind(&self) -> PersonKind {
        match self {
            Self::Student { .. } => PersonKind::Student,
            Self::Teacher { .. } => PersonKind::Teacher,
            Self::Staff { .. } => PersonKind::Staff,
        }
    }
}

/// `fullName` is accepted on input; `name` is what gets written back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    #[serde(default, alias = "fullName", deserialize_with = "form_text")]
    pub name: String,
    #[serde(default, deserialize_with = "form_text")]
    pub relationship: String,
    #[serde(default, deserialize_with = "form_text")]
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDraft {
    #[serde(default, deserialize_with = "form_text")]
    pub username: String,
    #[serde(default, deserialize_with = "form_text_opt")]
    pub reference_id: Option<String>,
    #[serde(default, deserialize_with = "form_text_opt")]
    pub password: Option<String>,
}

/// Wizard state for one person being onboarded. Every edit produces a new
/// draft; the previous one is left as it was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDraft {
    #[serde(flatten)]
    pub names: NameParts,
    #[serde(flatten)]
    pub account: AccountDraft,
    #[serde(flatten)]
    pub details: PersonDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
}

impl PersonDraft {
    pub fn new(kind: PersonKind) -> Self {
        Self {
            names: NameParts::default(),
            account: AccountDraft::default(),
            details: PersonDetails::empty(kind),
            emergency_contact: None,
        }
    }

    /// The finished credentials, once username, reference ID and password
    /// are all present.
    pub fn account(&self) -> Option<GeneratedAccount> {
        let username = self.account.username.trim();
        let reference_id = self.account.reference_id.as_deref().map(str::trim)?;
        let password = self.account.password.as_deref()?;
        if username.is_empty() || reference_id.is_empty() || password.is_empty() {
            return None;
        }
        Some(GeneratedAccount {
            username: username.to_string(),
            reference_id: reference_id.to_string(),
            password: password.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    FirstName,
    MiddleName,
    LastName,
    ReferenceId,
    Password,
    ClassId,
    LevelId,
    GuardianName,
    Department,
    Subjects,
    Role,
    EmergencyName,
    EmergencyRelationship,
    EmergencyPhone,
}

impl DraftField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "firstName" => Some(Self::FirstName),
            "middleName" => Some(Self::MiddleName),
            "lastName" => Some(Self::LastName),
            "referenceId" => Some(Self::ReferenceId),
            "password" => Some(Self::Password),
            "classId" => Some(Self::ClassId),
            "levelId" => Some(Self::LevelId),
            "guardianName" => Some(Self::GuardianName),
            "department" => Some(Self::Department),
            "subjects" => Some(Self::Subjects),
            "role" => Some(Self::Role),
            "emergencyContact.name" | "emergencyContact.fullName" => Some(Self::EmergencyName),
            "emergencyContact.relationship" => Some(Self::EmergencyRelationship),
            "emergencyContact.phone" => Some(Self::EmergencyPhone),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    ReferenceId,
    Password,
}

impl Credential {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "referenceId" => Some(Self::ReferenceId),
            "password" => Some(Self::Password),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftEdit {
    pub draft: PersonDraft,
    pub applied: bool,
}

pub fn update_draft_field(
    draft: &PersonDraft,
    field: DraftField,
    value: &str,
    settings: &IdentitySettings,
) -> DraftEdit {
    update_draft_field_with(
        draft,
        field,
        value,
        settings,
        &mut rand::thread_rng(),
        current_year(),
    )
}

/// Applies one form edit.
///
/// Name edits recompute the username; reference ID and password are only
/// filled when the username becomes available and they were never generated.
/// Fields that do not belong to the draft's person type are ignored.
pub fn update_draft_field_with<R: Rng>(
    draft: &PersonDraft,
    field: DraftField,
    value: &str,
    settings: &IdentitySettings,
    rng: &mut R,
    year: i32,
) -> DraftEdit {
    let mut next = draft.clone();
    let applied = match field {
        DraftField::FirstName => {
            next.names.first_name = value.to_string();
            true
        }
        DraftField::MiddleName => {
            next.names.middle_name = if value.trim().is_empty() {
                None
            } else {
                Some(value.to_string())
            };
            true
        }
        DraftField::LastName => {
            next.names.last_name = value.to_string();
            true
        }
        DraftField::ReferenceId => {
            next.account.reference_id = non_blank(value);
            true
        }
        DraftField::Password => {
            next.account.password = non_blank(value);
            true
        }
        DraftField::EmergencyName
        | DraftField::EmergencyRelationship
        | DraftField::EmergencyPhone => {
            let contact = next.emergency_contact.get_or_insert_with(EmergencyContact::default);
            let slot = match field {
                DraftField::EmergencyName => &mut contact.name,
                DraftField::EmergencyRelationship => &mut contact.relationship,
                _ => &mut contact.phone,
            };
            *slot = value.to_string();
            true
        }
        _ => apply_detail_field(&mut next.details, field, value),
    };

    if applied && matches!(field, DraftField::FirstName | DraftField::LastName) {
        next.account.username = generate_username(
            &next.names.first_name,
            &next.names.last_name,
            settings.pad_char,
        );
        if !next.account.username.is_empty() {
            ensure_generated(&mut next.account.reference_id, || {
                generate_reference_id_with(rng, year)
            });
            ensure_generated(&mut next.account.password, || {
                generate_password_with(rng, settings.password_length)
            });
        }
    }

    DraftEdit {
        draft: next,
        applied,
    }
}

fn apply_detail_field(details: &mut PersonDetails, field: DraftField, value: &str) -> bool {
    match (details, field) {
        (PersonDetails::Student { class_id, .. }, DraftField::ClassId) => {
            *class_id = value.trim().to_string();
        }
        (PersonDetails::Student { level_id, .. }, DraftField::LevelId) => {
            *level_id = value.trim().to_string();
        }
        (PersonDetails::Student { guardian_name, .. }, DraftField::GuardianName) => {
            *guardian_name = value.to_string();
        }
        (PersonDetails::Teacher { department, .. }, DraftField::Department) => {
            *department = value.trim().to_string();
        }
        (PersonDetails::Teacher { subjects, .. }, DraftField::Subjects) => {
            *subjects = split_list(value);
        }
        (PersonDetails::Staff { role }, DraftField::Role) => {
            *role = value.trim().to_string();
        }
        _ => return false,
    }
    true
}

fn non_blank(value: &str) -> Option<String> {
    let t = value.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

pub fn regenerate(
    draft: &PersonDraft,
    credential: Credential,
    settings: &IdentitySettings,
) -> PersonDraft {
    regenerate_with(
        draft,
        credential,
        settings,
        &mut rand::thread_rng(),
        current_year(),
    )
}

/// Explicit "regenerate" action: replaces exactly one credential.
pub fn regenerate_with<R: Rng>(
    draft: &PersonDraft,
    credential: Credential,
    settings: &IdentitySettings,
    rng: &mut R,
    year: i32,
) -> PersonDraft {
    let mut next = draft.clone();
    match credential {
        Credential::ReferenceId => {
            next.account.reference_id = Some(generate_reference_id_with(rng, year));
        }
        Credential::Password => {
            next.account.password = Some(generate_password_with(rng, settings.password_length));
        }
    }
    next
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAccount {
    pub username: String,
    pub reference_id: String,
    pub password: String,
}

/// The shape a downstream account store would keep. The plain password
/// never leaves this struct's constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub person_id: String,
    pub username: String,
    pub reference_id: String,
    pub password_hash: String,
    pub created_at: String,
}

impl AccountRecord {
    pub fn issue(account: &GeneratedAccount, created_at: DateTime<Utc>) -> Self {
        Self {
            person_id: uuid::Uuid::new_v4().to_string(),
            username: account.username.clone(),
            reference_id: account.reference_id.clone(),
            password_hash: sha256_hex(&account.password),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn username(first: &str, last: &str) -> String {
        generate_username(first, last, DEFAULT_PAD_CHAR)
    }

    fn edit(draft: &PersonDraft, field: DraftField, value: &str, rng: &mut StdRng) -> PersonDraft {
        update_draft_field_with(draft, field, value, &IdentitySettings::default(), rng, 2025).draft
    }

    #[test]
    fn username_takes_three_letters_of_each_part() {
        assert_eq!(username("Jessica", "Rose"), "jesros");
        assert_eq!(username("Jo", "Wu"), "jowu00");
        assert_eq!(username("Al", "Li"), "alli00");
        assert_eq!(username("O'Brien", "Mc-Dow"), "obrmcd");
        assert_eq!(username("  ANNA ", "b"), "annb00");
    }

    #[test]
    fn username_is_empty_until_both_parts_have_letters() {
        assert_eq!(username("", "Rose"), "");
        assert_eq!(username("Jessica", ""), "");
        assert_eq!(username("123", "Rose"), "");
    }

    #[test]
    fn username_uses_configured_pad() {
        assert_eq!(generate_username("Jo", "Wu", 'x'), "jowuxx");
        for (f, l) in [("Jessica", "Rose"), ("A", "B"), ("Ñuñez", "Émile")] {
            let u = username(f, l);
            assert_eq!(u.chars().count(), USERNAME_LEN, "{f} {l}");
            assert!(u.chars().all(|c| c.is_ascii_lowercase() || c == '0'));
        }
    }

    #[test]
    fn reference_id_is_year_plus_four_digits() {
        let mut r = rng();
        for _ in 0..50 {
            let id = generate_reference_id_with(&mut r, 2025);
            assert_eq!(id.len(), 8);
            assert!(id.chars().all(|c| c.is_ascii_digit()));
            assert!(id.starts_with("2025"));
        }
        let live = generate_reference_id();
        assert!(live.starts_with(&format!("{:04}", current_year())));
    }

    #[test]
    fn password_draws_from_alphanumerics() {
        let mut r = rng();
        let p = generate_password_with(&mut r, 6);
        assert_eq!(p.len(), 6);
        assert!(p.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(generate_password(32).len(), 32);
        assert_eq!(generate_password(0), "");
    }

    #[test]
    fn ensure_generated_only_fills_blank_slots() {
        let mut slot = None;
        assert!(ensure_generated(&mut slot, || "first".to_string()));
        assert!(!ensure_generated(&mut slot, || "second".to_string()));
        assert_eq!(slot.as_deref(), Some("first"));

        let mut blank = Some("  ".to_string());
        assert!(ensure_generated(&mut blank, || "filled".to_string()));
        assert_eq!(blank.as_deref(), Some("filled"));
    }

    #[test]
    fn name_edits_generate_credentials_once() {
        let mut r = rng();
        let d0 = PersonDraft::new(PersonKind::Student);
        let d1 = edit(&d0, DraftField::FirstName, "Jessica", &mut r);
        assert_eq!(d1.account.username, "");
        assert_eq!(d1.account.reference_id, None);
        assert_eq!(d1.account.password, None);

        let d2 = edit(&d1, DraftField::LastName, "Rose", &mut r);
        assert_eq!(d2.account.username, "jesros");
        let ref_id = d2.account.reference_id.clone().expect("reference id");
        let password = d2.account.password.clone().expect("password");

        let d3 = edit(&d2, DraftField::LastName, "Ross", &mut r);
        assert_eq!(d3.account.username, "jesros");
        let d4 = edit(&d3, DraftField::FirstName, "Jo", &mut r);
        assert_eq!(d4.account.username, "joros0");
        assert_eq!(d4.account.reference_id.as_deref(), Some(ref_id.as_str()));
        assert_eq!(d4.account.password.as_deref(), Some(password.as_str()));

        // earlier snapshot untouched
        assert_eq!(d1.account.username, "");
    }

    #[test]
    fn regenerate_replaces_only_the_named_credential() {
        let mut r = rng();
        let d = edit(&PersonDraft::new(PersonKind::Teacher), DraftField::FirstName, "Jo", &mut r);
        let d = edit(&d, DraftField::LastName, "Wu", &mut r);
        let before = d.account.clone();

        let after = regenerate_with(&d, Credential::Password, &IdentitySettings::default(), &mut r, 2025);
        assert_eq!(after.account.username, before.username);
        assert_eq!(after.account.reference_id, before.reference_id);
        assert_ne!(after.account.password, before.password);

        let after = regenerate_with(&after, Credential::ReferenceId, &IdentitySettings::default(), &mut r, 2026);
        assert_eq!(after.account.username, "jowu00");
        assert!(after.account.reference_id.as_deref().unwrap_or("").starts_with("2026"));
    }

    #[test]
    fn detail_fields_follow_person_type() {
        let mut r = rng();
        let student = PersonDraft::new(PersonKind::Student);
        let edited = update_draft_field_with(
            &student,
            DraftField::Department,
            "Science",
            &IdentitySettings::default(),
            &mut r,
            2025,
        );
        assert!(!edited.applied);
        assert_eq!(edited.draft, student);

        let teacher = edit(&PersonDraft::new(PersonKind::Teacher), DraftField::Subjects, "Math, Physics,,", &mut r);
        assert_eq!(
            teacher.details,
            PersonDetails::Teacher {
                department: String::new(),
                subjects: vec!["Math".to_string(), "Physics".to_string()],
            }
        );
    }

    #[test]
    fn draft_wire_shape_is_flat_and_accepts_full_name_alias() {
        let raw = serde_json::json!({
            "personType": "student",
            "firstName": "Jo",
            "lastName": "Wu",
            "username": "jowu00",
            "referenceId": "20251234",
            "classId": "c-7",
            "emergencyContact": { "fullName": "Mina Wu", "phone": "555" }
        });
        let draft: PersonDraft = serde_json::from_value(raw).expect("draft");
        assert_eq!(draft.details.kind(), PersonKind::Student);
        assert_eq!(draft.account.password, None);
        let contact = draft.emergency_contact.clone().expect("contact");
        assert_eq!(contact.name, "Mina Wu");

        let out = serde_json::to_value(&draft).expect("serialize");
        assert_eq!(out["personType"], "student");
        assert_eq!(out["classId"], "c-7");
        assert_eq!(out["emergencyContact"]["name"], "Mina Wu");
        assert!(out["emergencyContact"].get("fullName").is_none());
    }

    #[test]
    fn malformed_form_values_coerce_instead_of_failing() {
        let raw = serde_json::json!({
            "personType": "teacher",
            "firstName": null,
            "middleName": "  ",
            "lastName": 42,
            "username": false,
            "referenceId": 20251234,
            "password": "",
            "department": null,
            "subjects": "Math, Art",
            "emergencyContact": { "phone": 5550100 }
        });
        let draft: PersonDraft = serde_json::from_value(raw).expect("draft");
        assert_eq!(draft.names.first_name, "");
        assert_eq!(draft.names.middle_name, None);
        assert_eq!(draft.names.last_name, "42");
        assert_eq!(draft.account.username, "false");
        assert_eq!(draft.account.reference_id.as_deref(), Some("20251234"));
        assert_eq!(draft.account.password, None);
        assert_eq!(
            draft.details,
            PersonDetails::Teacher {
                department: String::new(),
                subjects: vec!["Math".to_string(), "Art".to_string()],
            }
        );
        assert_eq!(
            draft.emergency_contact.map(|c| c.phone).as_deref(),
            Some("5550100")
        );

        let mut r = rng();
        let d = edit(&PersonDraft::new(PersonKind::Staff), DraftField::FirstName, "Jo", &mut r);
        let mut wire = serde_json::to_value(&d).expect("serialize");
        wire["lastName"] = serde_json::Value::Null;
        let back: PersonDraft = serde_json::from_value(wire).expect("draft");
        assert_eq!(back.names.last_name, "");
        assert_eq!(back.account.username, "");
    }

    #[test]
    fn account_record_hashes_password() {
        let account = GeneratedAccount {
            username: "jesros".to_string(),
            reference_id: "20250042".to_string(),
            password: "abc".to_string(),
        };
        let at = Utc.with_ymd_and_hms(2025, 9, 1, 8, 30, 0).single().expect("timestamp");
        let rec = AccountRecord::issue(&account, at);
        assert_eq!(
            rec.password_hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(rec.created_at, "2025-09-01T08:30:00Z");
        assert_eq!(rec.person_id.len(), 36);

        let incomplete = PersonDraft::new(PersonKind::Staff);
        assert!(incomplete.account().is_none());
    }
}
