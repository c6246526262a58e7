use crate::ini::IniDocument;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

pub const REDDIT_SECTION: &str = "reddit_config";
pub const AWS_SECTION: &str = "aws_config";
pub const EXTRACTION_SECTION: &str = "reddit_extraction";

/// Keys each section must carry, plus the ones that may be left out or empty.
#[derive(Debug, Clone, Copy)]
pub struct SectionSchema {
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

impl SectionSchema {
    pub fn knows(&self, key: &str) -> bool {
        self.required.contains(&key) || self.optional.contains(&key)
    }
}

pub const SCHEMA: [SectionSchema; 3] = [
    SectionSchema {
        name: REDDIT_SECTION,
        required: &["secret", "developer", "name", "client_id"],
        optional: &[],
    },
    SectionSchema {
        name: AWS_SECTION,
        required: &[
            "bucket_name",
            "redshift_username",
            "redshift_password",
            "redshift_hostname",
            "redshift_role",
            "redshift_port",
            "redshift_database",
            "aws_region",
        ],
        optional: &["account_id"],
    },
    SectionSchema {
        name: EXTRACTION_SECTION,
        required: &["subreddit", "time_filter", "limit"],
        optional: &[],
    },
];

pub fn schema_for(section: &str) -> Option<&'static SectionSchema> {
    SCHEMA.iter().find(|schema| schema.name == section)
}

/// One problem found while checking the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigIssue {
    pub section: String,
    pub key: String,
    pub reason: String,
}

impl ConfigIssue {
    pub fn new(section: &str, key: &str, reason: impl Into<String>) -> Self {
        Self {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.section, self.key, self.reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeFilter {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeFilter {
    pub const ALL: [TimeFilter; 6] = [
        TimeFilter::Hour,
        TimeFilter::Day,
        TimeFilter::Week,
        TimeFilter::Month,
        TimeFilter::Year,
        TimeFilter::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Hour => "hour",
            TimeFilter::Day => "day",
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
            TimeFilter::Year => "year",
            TimeFilter::All => "all",
        }
    }
}

impl FromStr for TimeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeFilter::ALL
            .into_iter()
            .find(|filter| filter.as_str() == s.trim())
            .ok_or_else(|| "must be one of hour, day, week, month, year, all".to_string())
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post limit for one extraction run. Stored as `None` when unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtractionLimit {
    Unbounded,
    Bounded(NonZeroU64),
}

impl ExtractionLimit {
    pub const UNBOUNDED_SENTINEL: &'static str = "None";

    pub fn bounded(limit: u64) -> Option<Self> {
        NonZeroU64::new(limit).map(ExtractionLimit::Bounded)
    }

    pub fn as_option(&self) -> Option<u64> {
        match self {
            ExtractionLimit::Unbounded => None,
            ExtractionLimit::Bounded(limit) => Some(limit.get()),
        }
    }
}

impl FromStr for ExtractionLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == Self::UNBOUNDED_SENTINEL {
            return Ok(ExtractionLimit::Unbounded);
        }
        s.parse::<u64>()
            .ok()
            .and_then(ExtractionLimit::bounded)
            .ok_or_else(|| format!("must be a positive integer or None, got '{}'", s))
    }
}

impl fmt::Display for ExtractionLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionLimit::Unbounded => f.write_str(Self::UNBOUNDED_SENTINEL),
            ExtractionLimit::Bounded(limit) => write!(f, "{}", limit),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct RedditCredentials {
    pub client_id: String,
    pub secret: String,
    pub developer: String,
    pub name: String,
}

impl fmt::Debug for RedditCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedditCredentials")
            .field("client_id", &self.client_id)
            .field("secret", &"<redacted>")
            .field("developer", &self.developer)
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct AwsSettings {
    pub bucket_name: String,
    pub redshift_username: String,
    pub redshift_password: String,
    pub redshift_hostname: String,
    pub redshift_role: String,
    pub redshift_port: u16,
    pub redshift_database: String,
    pub account_id: Option<String>,
    pub aws_region: String,
}

impl AwsSettings {
    /// Everything except the password, for display.
    pub fn redacted(&self) -> BTreeMap<&'static str, String> {
        let mut view = BTreeMap::new();
        view.insert("bucket_name", self.bucket_name.clone());
        view.insert("redshift_username", self.redshift_username.clone());
        view.insert("redshift_hostname", self.redshift_hostname.clone());
        view.insert("redshift_role", self.redshift_role.clone());
        view.insert("redshift_port", self.redshift_port.to_string());
        view.insert("redshift_database", self.redshift_database.clone());
        view.insert("aws_region", self.aws_region.clone());
        if let Some(account_id) = &self.account_id {
            view.insert("account_id", account_id.clone());
        }
        view
    }
}

impl fmt::Debug for AwsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsSettings")
            .field("bucket_name", &self.bucket_name)
            .field("redshift_username", &self.redshift_username)
            .field("redshift_password", &"<redacted>")
            .field("redshift_hostname", &self.redshift_hostname)
            .field("redshift_role", &self.redshift_role)
            .field("redshift_port", &self.redshift_port)
            .field("redshift_database", &self.redshift_database)
            .field("account_id", &self.account_id)
            .field("aws_region", &self.aws_region)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionSettings {
    pub subreddit: String,
    pub time_filter: TimeFilter,
    pub limit: ExtractionLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub reddit: RedditCredentials,
    pub aws: AwsSettings,
    pub extraction: ExtractionSettings,
}

impl Configuration {
    /// Decodes and validates a parsed file, collecting every problem rather
    /// than stopping at the first.
    pub fn from_document(doc: &IniDocument) -> Result<Self, Vec<ConfigIssue>> {
        let mut fields = Fields {
            doc,
            issues: Vec::new(),
        };

        let reddit = RedditCredentials {
            client_id: fields.required(REDDIT_SECTION, "client_id"),
            secret: fields.required(REDDIT_SECTION, "secret"),
            developer: fields.required(REDDIT_SECTION, "developer"),
            name: fields.required(REDDIT_SECTION, "name"),
        };

        let redshift_port = fields.typed(AWS_SECTION, "redshift_port", parse_port);
        let time_filter =
            fields.typed(EXTRACTION_SECTION, "time_filter", |v| v.parse::<TimeFilter>());
        let limit = fields.typed(EXTRACTION_SECTION, "limit", |v| v.parse::<ExtractionLimit>());

        let aws = AwsSettings {
            bucket_name: fields.required(AWS_SECTION, "bucket_name"),
            redshift_username: fields.required(AWS_SECTION, "redshift_username"),
            redshift_password: fields.required(AWS_SECTION, "redshift_password"),
            redshift_hostname: fields.required(AWS_SECTION, "redshift_hostname"),
            redshift_role: fields.required(AWS_SECTION, "redshift_role"),
            redshift_port: redshift_port.unwrap_or_default(),
            redshift_database: fields.required(AWS_SECTION, "redshift_database"),
            account_id: fields.optional(AWS_SECTION, "account_id"),
            aws_region: fields.required(AWS_SECTION, "aws_region"),
        };
        let subreddit = fields.required(EXTRACTION_SECTION, "subreddit");

        match (time_filter, limit) {
            (Some(time_filter), Some(limit)) if fields.issues.is_empty() => Ok(Configuration {
                reddit,
                aws,
                extraction: ExtractionSettings {
                    subreddit,
                    time_filter,
                    limit,
                },
            }),
            _ => Err(fields.issues),
        }
    }
}

fn parse_port(value: &str) -> Result<u16, String> {
    value
        .parse::<u16>()
        .ok()
        .filter(|port| *port > 0)
        .ok_or_else(|| format!("must be a port number, got '{}'", value))
}

struct Fields<'a> {
    doc: &'a IniDocument,
    issues: Vec<ConfigIssue>,
}

impl<'a> Fields<'a> {
    fn raw(&mut self, section: &str, key: &str) -> Option<&'a str> {
        let doc = self.doc;
        if !doc.has_section(section) {
            self.issues.push(ConfigIssue::new(
                section,
                key,
                format!("missing (section [{}] is absent)", section),
            ));
            return None;
        }
        match doc.get(section, key) {
            None => {
                self.issues.push(ConfigIssue::new(section, key, "missing"));
                None
            }
            Some(value) if value.trim().is_empty() => {
                self.issues
                    .push(ConfigIssue::new(section, key, "must not be empty"));
                None
            }
            Some(value) => Some(value.trim()),
        }
    }

    fn required(&mut self, section: &str, key: &str) -> String {
        self.raw(section, key).unwrap_or_default().to_string()
    }

    fn optional(&self, section: &str, key: &str) -> Option<String> {
        self.doc
            .get(section, key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn typed<T>(
        &mut self,
        section: &str,
        key: &str,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> Option<T> {
        let value = self.raw(section, key)?;
        match parse(value) {
            Ok(parsed) => Some(parsed),
            Err(reason) => {
                self.issues.push(ConfigIssue::new(section, key, reason));
                None
            }
        }
    }
}

/// Per-key changes to apply on top of the file as it is on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(key.into().trim().to_ascii_lowercase(), value.into());
        self
    }

    pub fn subreddit(self, name: impl Into<String>) -> Self {
        self.set(EXTRACTION_SECTION, "subreddit", name)
    }

    pub fn time_filter(self, filter: TimeFilter) -> Self {
        self.set(EXTRACTION_SECTION, "time_filter", filter.as_str())
    }

    pub fn limit(self, limit: ExtractionLimit) -> Self {
        self.set(EXTRACTION_SECTION, "limit", limit.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.sections.values().all(BTreeMap::is_empty)
    }

    pub fn touches(&self, section: &str, key: &str) -> bool {
        self.sections
            .get(section)
            .is_some_and(|keys| keys.contains_key(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.sections.iter().flat_map(|(section, keys)| {
            keys.iter()
                .map(move |(key, value)| (section.as_str(), key.as_str(), value.as_str()))
        })
    }
}

impl From<BTreeMap<String, BTreeMap<String, String>>> for ConfigUpdate {
    fn from(sections: BTreeMap<String, BTreeMap<String, String>>) -> Self {
        sections
            .into_iter()
            .flat_map(|(section, keys)| {
                keys.into_iter()
                    .map(move |(key, value)| (section.clone(), key, value))
            })
            .fold(ConfigUpdate::new(), |update, (section, key, value)| {
                update.set(section, key, value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_parsing() {
        assert_eq!(
            "None".parse::<ExtractionLimit>(),
            Ok(ExtractionLimit::Unbounded)
        );
        assert_eq!(
            " 250 ".parse::<ExtractionLimit>(),
            Ok(ExtractionLimit::bounded(250).unwrap())
        );
        assert!("0".parse::<ExtractionLimit>().is_err());
        assert!("-5".parse::<ExtractionLimit>().is_err());
        assert!("lots".parse::<ExtractionLimit>().is_err());
        assert!("none".parse::<ExtractionLimit>().is_err());
        assert!("NONE".parse::<ExtractionLimit>().is_err());
        assert_eq!(
            "5000000000".parse::<ExtractionLimit>(),
            Ok(ExtractionLimit::bounded(5_000_000_000).unwrap())
        );
        assert_eq!(ExtractionLimit::Unbounded.to_string(), "None");
        assert_eq!(ExtractionLimit::bounded(7).unwrap().as_option(), Some(7));
    }

    #[test]
    fn test_time_filter_parsing() {
        for filter in TimeFilter::ALL {
            assert_eq!(filter.as_str().parse::<TimeFilter>(), Ok(filter));
        }
        assert!("fortnight".parse::<TimeFilter>().is_err());
    }

    #[test]
    fn test_update_from_map_normalizes_keys() {
        let mut keys = BTreeMap::new();
        keys.insert(" Subreddit ".to_string(), "python".to_string());
        let mut sections = BTreeMap::new();
        sections.insert(EXTRACTION_SECTION.to_string(), keys);

        let update = ConfigUpdate::from(sections);
        assert!(update.touches(EXTRACTION_SECTION, "subreddit"));
        assert_eq!(
            update.iter().collect::<Vec<_>>(),
            vec![(EXTRACTION_SECTION, "subreddit", "python")]
        );
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let credentials = RedditCredentials {
            client_id: "abc".to_string(),
            secret: "hunter2".to_string(),
            developer: "alice".to_string(),
            name: "lens".to_string(),
        };
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }
}
