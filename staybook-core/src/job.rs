//! Job listings and their search.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StaybookError, StaybookResult};
use crate::store::{Document, new_id};

pub const DEFAULT_LIST_LIMIT: usize = 100;
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListing {
    pub id: String,
    pub shop_name: String,
    pub job_title: String,
    pub job_description: String,
    pub location: String,
    pub industry: String,
    /// Monthly salary in yen.
    pub salary: i64,
    pub working_hours: String,
    pub requirements: String,
    pub customer_unit_price: String,
    pub seats: String,
    pub smoking_info: String,
    pub nearest_station: String,
    pub holidays: String,
    pub company: String,
    pub days_off: String,
    pub benefits: String,
    pub ideal_candidate: String,
    pub skills_to_acquire: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub employer_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Document for JobListing {
    const COLLECTION: &'static str = "jobs";
    const KIND: &'static str = "Job";

    fn id(&self) -> &str {
        &self.id
    }
}

impl JobListing {
    /// Every text field is required, and so is a positive salary.
    pub fn validate(&self) -> StaybookResult<()> {
        let required = [
            ("shop_name", &self.shop_name),
            ("job_title", &self.job_title),
            ("job_description", &self.job_description),
            ("location", &self.location),
            ("industry", &self.industry),
            ("working_hours", &self.working_hours),
            ("requirements", &self.requirements),
            ("customer_unit_price", &self.customer_unit_price),
            ("seats", &self.seats),
            ("smoking_info", &self.smoking_info),
            ("nearest_station", &self.nearest_station),
            ("holidays", &self.holidays),
            ("company", &self.company),
            ("days_off", &self.days_off),
            ("benefits", &self.benefits),
            ("ideal_candidate", &self.ideal_candidate),
            ("skills_to_acquire", &self.skills_to_acquire),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(StaybookError::Validation(format!("{field} is required")));
        }
        if self.salary <= 0 {
            return Err(StaybookError::Validation("salary is required".into()));
        }
        Ok(())
    }
}

/// A listing as submitted. Missing fields fail validation rather than parsing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDraft {
    pub shop_name: String,
    pub job_title: String,
    pub job_description: String,
    pub location: String,
    pub industry: String,
    pub salary: Option<i64>,
    pub working_hours: String,
    pub requirements: String,
    pub customer_unit_price: String,
    pub seats: String,
    pub smoking_info: String,
    pub nearest_station: String,
    pub holidays: String,
    pub company: String,
    pub days_off: String,
    pub benefits: String,
    pub ideal_candidate: String,
    pub skills_to_acquire: String,
    pub employer_id: Option<String>,
}

impl JobDraft {
    pub fn into_listing(self) -> StaybookResult<JobListing> {
        let listing = JobListing {
            id: new_id(),
            shop_name: self.shop_name,
            job_title: self.job_title,
            job_description: self.job_description,
            location: self.location,
            industry: self.industry,
            salary: self.salary.unwrap_or_default(),
            working_hours: self.working_hours,
            requirements: self.requirements,
            customer_unit_price: self.customer_unit_price,
            seats: self.seats,
            smoking_info: self.smoking_info,
            nearest_station: self.nearest_station,
            holidays: self.holidays,
            company: self.company,
            days_off: self.days_off,
            benefits: self.benefits,
            ideal_candidate: self.ideal_candidate,
            skills_to_acquire: self.skills_to_acquire,
            status: JobStatus::Open,
            employer_id: self.employer_id,
            created_at: Utc::now(),
        };
        listing.validate()?;
        Ok(listing)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSort {
    #[default]
    CreatedAt,
    Salary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobQuery {
    pub industry: Option<String>,
    pub location: Option<String>,
    pub salary_min: Option<i64>,
    pub sort_by: JobSort,
    pub sort_order: SortOrder,
    pub page_size: Option<usize>,
    /// Id of the last listing of the previous page.
    pub page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPage {
    pub jobs: Vec<JobListing>,
    /// `None` once there is nothing after this page.
    pub next_page_token: Option<String>,
}

/// Filter, sort and page `jobs`.
pub fn search(mut jobs: Vec<JobListing>, query: &JobQuery) -> StaybookResult<JobPage> {
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(StaybookError::Validation(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    jobs.retain(|job| {
        query.industry.as_ref().is_none_or(|i| &job.industry == i)
            && query.location.as_ref().is_none_or(|l| &job.location == l)
            && query.salary_min.is_none_or(|min| job.salary >= min)
    });

    jobs.sort_by(|a, b| {
        let primary = match query.sort_by {
            JobSort::CreatedAt => a.created_at.cmp(&b.created_at),
            JobSort::Salary => a.salary.cmp(&b.salary),
        };
        let ordering = primary.then_with(|| a.id.cmp(&b.id));
        match query.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let start = match &query.page_token {
        None => 0,
        Some(token) => match jobs.iter().position(|job| &job.id == token) {
            Some(pos) => pos + 1,
            None => {
                return Err(StaybookError::Validation(format!(
                    "unknown page_token '{token}'"
                )));
            }
        },
    };

    let remaining = jobs.len().saturating_sub(start);
    let page: Vec<JobListing> = jobs.into_iter().skip(start).take(page_size).collect();
    let next_page_token = match remaining.cmp(&page_size) {
        Ordering::Greater => page.last().map(|job| job.id.clone()),
        _ => None,
    };

    Ok(JobPage {
        jobs: page,
        next_page_token,
    })
}
