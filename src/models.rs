use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Server-assigned member identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Membership categories offered by the front desk.
///
/// The create and edit forms of the legacy client disagree on whether
/// "Quincena" or "Trimestral" is offered, so both are kept and anything
/// else the backend sends survives untouched in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum MembershipType {
    #[default]
    None,
    Monthly,
    Fortnight,
    Quarterly,
    Semiannual,
    Annual,
    Other(String),
}

impl MembershipType {
    pub const OFFERED: [MembershipType; 6] = [
        MembershipType::None,
        MembershipType::Monthly,
        MembershipType::Fortnight,
        MembershipType::Quarterly,
        MembershipType::Semiannual,
        MembershipType::Annual,
    ];

    pub fn label(&self) -> &str {
        match self {
            MembershipType::None => "Sin membresía",
            MembershipType::Monthly => "Mensual",
            MembershipType::Fortnight => "Quincena",
            MembershipType::Quarterly => "Trimestral",
            MembershipType::Semiannual => "Semestral",
            MembershipType::Annual => "Anual",
            MembershipType::Other(label) => label,
        }
    }

    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        Self::OFFERED
            .iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| {
                if trimmed.is_empty() {
                    MembershipType::None
                } else {
                    MembershipType::Other(trimmed.to_string())
                }
            })
    }
}

impl fmt::Display for MembershipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `None` travels as JSON `null`, the way the backend stores a member
/// without a plan.
impl Serialize for MembershipType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MembershipType::None => serializer.serialize_none(),
            other => serializer.serialize_str(other.label()),
        }
    }
}

impl<'de> Deserialize<'de> for MembershipType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label.map(|l| Self::parse(&l)).unwrap_or_default())
    }
}

/// Join timestamp as reported by the backend. Accepts RFC 3339, naive
/// date-times and bare dates (taken as midnight UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JoinedAt(pub DateTime<Utc>);

impl JoinedAt {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self(value.with_timezone(&Utc)));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(value) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(Self(value.and_utc()));
            }
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|value| Self(value.and_utc()))
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }
}

impl Serialize for JoinedAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl<'de> Deserialize<'de> for JoinedAt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid joined_at timestamp: {raw}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub cedula: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub membership_type: MembershipType,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub joined_at: Option<JoinedAt>,
}

impl Member {
    pub fn matches(&self, needle_lowercase: &str) -> bool {
        [&self.full_name, &self.cedula, &self.email]
            .iter()
            .any(|field| field.to_lowercase().contains(needle_lowercase))
    }

    pub fn to_payload(&self) -> MemberPayload {
        MemberPayload {
            full_name: self.full_name.clone(),
            cedula: self.cedula.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            membership_type: self.membership_type.clone(),
            is_active: self.is_active,
        }
    }
}

/// Writable member fields, sent on create and full replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberPayload {
    pub full_name: String,
    pub cedula: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub membership_type: MembershipType,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl MemberPayload {
    pub fn new(
        full_name: impl Into<String>,
        cedula: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            cedula: cedula.into(),
            email: email.into(),
            phone: phone.into(),
            membership_type: MembershipType::default(),
            is_active: default_active(),
        }
    }

    pub fn with_membership(mut self, membership_type: MembershipType) -> Self {
        self.membership_type = membership_type;
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Required-field presence check run before anything reaches the network.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        for (field, value) in [
            ("full_name", &self.full_name),
            ("cedula", &self.cedula),
            ("email", &self.email),
            ("phone", &self.phone),
        ] {
            if value.trim().is_empty() {
                errors.insert(field, "is required");
            }
        }
        errors.into_result()
    }
}

/// Full-replace body: the payload plus the identifier being replaced.
#[derive(Debug, Serialize)]
pub struct MemberReplace<'a> {
    pub id: MemberId,
    #[serde(flatten)]
    pub payload: &'a MemberPayload,
}

#[derive(Debug, Serialize)]
pub struct ActivePatch {
    pub is_active: bool,
}

/// Field name to message, for local validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.insert(field, message);
        errors
    }

    pub fn insert(&mut self, field: &str, message: &str) {
        self.0.insert(field.to_string(), message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k} {v}")).collect();
        f.write_str(&parts.join(", "))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TokenPair {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct GymStats {
    pub total_clientes: u64,
    pub clientes_activos: u64,
    #[serde(default)]
    pub clientes_presentes: u64,
}

impl GymStats {
    pub fn inactive(&self) -> u64 {
        self.total_clientes.saturating_sub(self.clientes_activos)
    }
}

#[derive(Debug, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub joined: u64,
}

#[derive(Debug, Serialize)]
pub struct WeeklyPoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub joined: u64,
}

#[derive(Debug, Serialize)]
pub struct DirectoryStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub by_membership: BTreeMap<String, u64>,
    pub joined_last_7_days: Vec<DailyPoint>,
    pub weekly_joins: Vec<WeeklyPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: u64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventPayload {
    pub title: String,
    pub description: String,
    pub start: String,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Member form as posted by the admin pages. Unchecked checkboxes are absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub cedula: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub membership_type: String,
    #[serde(default)]
    pub is_active: Option<String>,
}

impl MemberForm {
    pub fn blank() -> Self {
        Self {
            membership_type: MembershipType::default().label().to_string(),
            is_active: Some("on".into()),
            ..Self::default()
        }
    }

    pub fn from_member(member: &Member) -> Self {
        Self {
            full_name: member.full_name.clone(),
            cedula: member.cedula.clone(),
            email: member.email.clone(),
            phone: member.phone.clone(),
            membership_type: member.membership_type.label().to_string(),
            is_active: member.is_active.then(|| "on".to_string()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active.is_some()
    }

    pub fn to_payload(&self) -> MemberPayload {
        MemberPayload::new(
            self.full_name.trim(),
            self.cedula.trim(),
            self.email.trim(),
            self.phone.trim(),
        )
        .with_membership(MembershipType::parse(&self.membership_type))
        .with_active(self.is_active())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MembersQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmForm {
    #[serde(default)]
    pub confirm: Option<String>,
}

impl ConfirmForm {
    pub fn confirmed(&self) -> bool {
        matches!(self.confirm.as_deref(), Some("yes") | Some("on"))
    }
}

#[derive(Debug, Deserialize)]
pub struct EventForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
}
