use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::catalog::{JobCatalog, JobDraft, JobStatus, JobUpdate, PayCadence, ProviderId};
use super::ledger::ApplicationStore;
use super::service::{MarketplaceError, MarketplaceService};

#[derive(Debug)]
pub enum SeedImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Service(MarketplaceError),
}

impl std::fmt::Display for SeedImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedImportError::Io(err) => write!(f, "failed to read seed file: {}", err),
            SeedImportError::Csv(err) => write!(f, "invalid seed CSV data: {}", err),
            SeedImportError::Service(err) => {
                write!(f, "could not publish seeded job: {}", err)
            }
        }
    }
}

impl std::error::Error for SeedImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SeedImportError::Io(err) => Some(err),
            SeedImportError::Csv(err) => Some(err),
            SeedImportError::Service(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SeedImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for SeedImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<MarketplaceError> for SeedImportError {
    fn from(err: MarketplaceError) -> Self {
        Self::Service(err)
    }
}

#[derive(Debug, Deserialize)]
struct SeedRow {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Provider", default, deserialize_with = "empty_string_as_none")]
    provider: Option<String>,
    #[serde(
        rename = "Description",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    description: Option<String>,
    #[serde(rename = "Location", default, deserialize_with = "empty_string_as_none")]
    location: Option<String>,
    #[serde(rename = "Skills", default, deserialize_with = "empty_string_as_none")]
    skills: Option<String>,
    #[serde(
        rename = "Pay Amount",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pay_amount: Option<String>,
    #[serde(
        rename = "Pay Cadence",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pay_cadence: Option<String>,
    #[serde(
        rename = "Work Type",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    work_type: Option<String>,
    #[serde(
        rename = "Min Rating",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    min_rating: Option<String>,
    #[serde(rename = "Status", default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
}

impl SeedRow {
    /// Rows without a usable title, provider, location, pay amount, or pay
    /// cadence are not importable.
    fn into_draft(self) -> Option<(JobDraft, Option<JobStatus>)> {
        let title = non_blank(&self.title)?;
        let provider = self.provider.as_deref().and_then(non_blank)?;
        let location = self.location.as_deref().and_then(non_blank)?;
        let pay_amount = self.pay_amount.as_deref()?.trim().parse().ok()?;
        let pay_cadence = self.pay_cadence.as_deref().and_then(PayCadence::parse_loose)?;

        let draft = JobDraft {
            title,
            provider: ProviderId(provider),
            description: self.description.clone().unwrap_or_default(),
            location,
            skills: self.skills.as_deref().map(split_skills).unwrap_or_default(),
            pay_amount,
            pay_cadence,
            work_type: self.work_type.clone().unwrap_or_default(),
            min_rating: self
                .min_rating
                .as_deref()
                .and_then(|raw| raw.trim().parse().ok())
                .unwrap_or(0.0),
        };
        let status = self.status.as_deref().and_then(JobStatus::parse_loose);
        Some((draft, status))
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn split_skills(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}

/// Outcome of one seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: usize,
    pub skipped: usize,
}

/// Loads catalog postings from a CSV export. Unusable rows are skipped and
/// counted rather than failing the whole import; every accepted row is
/// published through the service so it gets a real id and zeroed counters.
pub struct CatalogSeeder;

impl CatalogSeeder {
    pub fn from_path<C, L, P>(
        service: &MarketplaceService<C, L>,
        path: P,
    ) -> Result<SeedSummary, SeedImportError>
    where
        C: JobCatalog + 'static,
        L: ApplicationStore + 'static,
        P: AsRef<Path>,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(service, file)
    }

    pub fn from_reader<C, L, R>(
        service: &MarketplaceService<C, L>,
        reader: R,
    ) -> Result<SeedSummary, SeedImportError>
    where
        C: JobCatalog + 'static,
        L: ApplicationStore + 'static,
        R: Read,
    {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut summary = SeedSummary::default();
        for record in csv_reader.deserialize::<SeedRow>() {
            let row = record?;
            let Some((draft, status)) = row.into_draft() else {
                summary.skipped += 1;
                continue;
            };

            let job = service.create_job(draft)?;
            if let Some(status) = status.filter(|status| *status != JobStatus::Active) {
                service.update_job(
                    &job.id,
                    JobUpdate {
                        status: Some(status),
                        ..JobUpdate::default()
                    },
                )?;
            }
            summary.created += 1;
        }

        Ok(summary)
    }
}
