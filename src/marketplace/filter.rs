use serde::Deserialize;

use super::catalog::{Job, JobStatus, PayCadence};

/// Raw search input exactly as callers supply it. List fields take
/// comma-separated values; numeric fields arrive as text and are parsed
/// leniently when building a [`SearchFilter`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub cadence: Option<String>,
    #[serde(default)]
    pub min_pay: Option<String>,
    #[serde(default)]
    pub min_rating: Option<String>,
}

/// Typed constraint set produced from a [`SearchQuery`]. Absent fields
/// constrain nothing; an empty filter matches every non-completed job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    pub locations: Vec<String>,
    pub skills: Vec<String>,
    pub cadence: Option<PayCadence>,
    pub min_pay: Option<u32>,
    pub min_rating: Option<f32>,
}

impl SearchFilter {
    /// Build a filter from raw input. Malformed numerics and unknown
    /// cadences degrade to an absent constraint rather than an error.
    pub fn from_query(query: SearchQuery) -> Self {
        Self {
            locations: query.location.as_deref().map(split_terms).unwrap_or_default(),
            skills: query.skill.as_deref().map(split_terms).unwrap_or_default(),
            cadence: query.cadence.as_deref().and_then(PayCadence::parse_loose),
            min_pay: query.min_pay.and_then(|raw| raw.trim().parse().ok()),
            min_rating: query.min_rating.and_then(|raw| raw.trim().parse().ok()),
        }
    }

    /// Whether a job satisfies every populated constraint. Completed jobs
    /// never match, whatever the constraints say.
    pub fn matches(&self, job: &Job) -> bool {
        if job.status == JobStatus::Completed {
            return false;
        }
        if !self.locations.is_empty() {
            let location = job.location.to_lowercase();
            if !self.locations.iter().any(|needle| location.contains(needle)) {
                return false;
            }
        }
        if !self.skills.is_empty() {
            let hit = job.skills.iter().any(|skill| {
                let skill = skill.to_lowercase();
                self.skills.iter().any(|needle| skill.contains(needle))
            });
            if !hit {
                return false;
            }
        }
        if let Some(cadence) = self.cadence {
            if job.pay_cadence != cadence {
                return false;
            }
        }
        if let Some(min_pay) = self.min_pay {
            if job.pay_amount < min_pay {
                return false;
            }
        }
        if let Some(min_rating) = self.min_rating {
            if job.min_rating < min_rating {
                return false;
            }
        }
        true
    }
}

/// Lazily winnow `jobs` down to those matching `filter`, preserving the
/// input order.
pub fn filter_jobs<'a, I>(jobs: I, filter: &'a SearchFilter) -> impl Iterator<Item = &'a Job> + 'a
where
    I: IntoIterator<Item = &'a Job>,
    I::IntoIter: 'a,
{
    jobs.into_iter().filter(move |job| filter.matches(job))
}

fn split_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}
