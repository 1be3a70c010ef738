//! Rental properties.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::availability::{AvailabilityWindow, DateSpan};
use crate::error::{StaybookError, StaybookResult};
use crate::feed::normalize_feed_url;
use crate::pricing::RateCard;
use crate::store::{Document, new_id};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,

    /// Price per night, minor currency units.
    pub price: i64,
    #[serde(default)]
    pub monthly_rate: Option<i64>,
    #[serde(default)]
    pub cleaning_fee: Option<i64>,

    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    pub max_guests: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub check_in_time: Option<String>,
    #[serde(default)]
    pub check_out_time: Option<String>,

    pub available_from: NaiveDate,
    pub available_to: NaiveDate,
    #[serde(default)]
    pub closed_days: Vec<Weekday>,
    #[serde(default)]
    pub ical_urls: Vec<String>,
    /// IANA zone used to turn feed timestamps into dates. UTC when unset.
    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub status: PropertyStatus,

    /// Busy spans last read from each iCal URL.
    #[serde(default)]
    pub external_busy: BTreeMap<String, Vec<DateSpan>>,
    /// Bookable dates as of the last recomputation.
    #[serde(default)]
    pub available_dates: Vec<NaiveDate>,
    #[serde(default)]
    pub last_refreshed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Property {
    const COLLECTION: &'static str = "properties";
    const KIND: &'static str = "Property";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Property {
    pub fn window(&self) -> StaybookResult<AvailabilityWindow> {
        AvailabilityWindow::new(self.available_from, self.available_to)
    }

    pub fn tz(&self) -> StaybookResult<Tz> {
        parse_timezone(self.timezone.as_deref())
    }

    pub fn rate_card(&self, default_cleaning_fee: i64) -> RateCard {
        RateCard {
            nightly: self.price,
            monthly: self.monthly_rate,
            cleaning_fee: self.cleaning_fee.unwrap_or(default_cleaning_fee),
        }
    }

    /// Cached busy spans of every feed, in no particular order.
    pub fn external_spans(&self) -> Vec<DateSpan> {
        self.external_busy.values().flatten().copied().collect()
    }

    /// Window and zone that cached feed spans were read against.
    pub fn feed_frame(&self) -> (NaiveDate, NaiveDate, Option<&str>) {
        (self.available_from, self.available_to, self.timezone.as_deref())
    }

    /// Whether the cached feed spans no longer describe this property.
    pub fn feed_view_changed(&self, before: &Property) -> bool {
        self.feed_frame() != before.feed_frame() || self.ical_urls != before.ical_urls
    }

    pub fn is_published(&self) -> bool {
        self.status == PropertyStatus::Published
    }

    fn validate(&self) -> StaybookResult<()> {
        if self.title.trim().is_empty() {
            return Err(StaybookError::Validation("title is required".into()));
        }
        if self.price < 0 {
            return Err(StaybookError::Validation("price cannot be negative".into()));
        }
        if self.monthly_rate.is_some_and(|r| r < 0) || self.cleaning_fee.is_some_and(|f| f < 0) {
            return Err(StaybookError::Validation("rates cannot be negative".into()));
        }
        if self.max_guests == 0 {
            return Err(StaybookError::Validation("max_guests must be at least 1".into()));
        }
        self.window()?;
        self.tz()?;
        for url in &self.ical_urls {
            normalize_feed_url(url)?;
        }
        Ok(())
    }

    /// Apply a partial update. Feed caches of removed URLs are dropped.
    pub fn apply(&mut self, patch: PropertyPatch) -> StaybookResult<()> {
        if let Some(id) = &patch.id
            && id != &self.id
        {
            return Err(StaybookError::Validation(format!(
                "property id '{id}' does not match '{}'",
                self.id
            )));
        }

        let PropertyPatch {
            id: _,
            title,
            description,
            address,
            price,
            monthly_rate,
            cleaning_fee,
            bedrooms,
            bathrooms,
            max_guests,
            amenities,
            image_urls,
            check_in_time,
            check_out_time,
            available_from,
            available_to,
            closed_days,
            ical_urls,
            timezone,
            owner_id,
        } = patch;

        if let Some(v) = title {
            self.title = v;
        }
        if let Some(v) = description {
            self.description = v;
        }
        if let Some(v) = address {
            self.address = v;
        }
        if let Some(v) = price {
            self.price = v;
        }
        if let Some(v) = monthly_rate {
            self.monthly_rate = Some(v);
        }
        if let Some(v) = cleaning_fee {
            self.cleaning_fee = Some(v);
        }
        if let Some(v) = bedrooms {
            self.bedrooms = v;
        }
        if let Some(v) = bathrooms {
            self.bathrooms = v;
        }
        if let Some(v) = max_guests {
            self.max_guests = v;
        }
        if let Some(v) = amenities {
            self.amenities = v;
        }
        if let Some(v) = image_urls {
            self.image_urls = v;
        }
        if let Some(v) = check_in_time {
            self.check_in_time = Some(v);
        }
        if let Some(v) = check_out_time {
            self.check_out_time = Some(v);
        }
        if let Some(v) = available_from {
            self.available_from = v;
        }
        if let Some(v) = available_to {
            self.available_to = v;
        }
        if let Some(v) = closed_days {
            self.closed_days = v;
        }
        if let Some(v) = ical_urls {
            self.external_busy.retain(|url, _| v.contains(url));
            self.ical_urls = v;
        }
        if let Some(v) = timezone {
            self.timezone = Some(v);
        }
        if let Some(v) = owner_id {
            self.owner_id = Some(v);
        }

        self.validate()?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Fields accepted when creating a property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProperty {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    pub price: i64,
    #[serde(default)]
    pub monthly_rate: Option<i64>,
    #[serde(default)]
    pub cleaning_fee: Option<i64>,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(default = "default_max_guests")]
    pub max_guests: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub check_in_time: Option<String>,
    #[serde(default)]
    pub check_out_time: Option<String>,
    pub available_from: NaiveDate,
    pub available_to: NaiveDate,
    #[serde(default)]
    pub closed_days: Vec<Weekday>,
    #[serde(default)]
    pub ical_urls: Vec<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
}

fn default_max_guests() -> u32 {
    2
}

impl NewProperty {
    /// Validate and turn into a draft property with a fresh id.
    pub fn into_property(self) -> StaybookResult<Property> {
        let now = Utc::now();
        let property = Property {
            id: new_id(),
            title: self.title,
            description: self.description,
            address: self.address,
            price: self.price,
            monthly_rate: self.monthly_rate,
            cleaning_fee: self.cleaning_fee,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            max_guests: self.max_guests,
            amenities: self.amenities,
            image_urls: self.image_urls,
            check_in_time: self.check_in_time,
            check_out_time: self.check_out_time,
            available_from: self.available_from,
            available_to: self.available_to,
            closed_days: self.closed_days,
            ical_urls: self.ical_urls,
            timezone: self.timezone,
            owner_id: self.owner_id,
            status: PropertyStatus::Draft,
            external_busy: BTreeMap::new(),
            available_dates: Vec::new(),
            last_refreshed_at: None,
            created_at: now,
            updated_at: now,
        };
        property.validate()?;
        Ok(property)
    }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyPatch {
    /// When present it must match the property being updated.
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub price: Option<i64>,
    pub monthly_rate: Option<i64>,
    pub cleaning_fee: Option<i64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub max_guests: Option<u32>,
    pub amenities: Option<Vec<String>>,
    pub image_urls: Option<Vec<String>>,
    pub check_in_time: Option<String>,
    pub check_out_time: Option<String>,
    pub available_from: Option<NaiveDate>,
    pub available_to: Option<NaiveDate>,
    pub closed_days: Option<Vec<Weekday>>,
    pub ical_urls: Option<Vec<String>>,
    pub timezone: Option<String>,
    pub owner_id: Option<String>,
}

fn parse_timezone(name: Option<&str>) -> StaybookResult<Tz> {
    match name {
        None => Ok(chrono_tz::UTC),
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| StaybookError::Validation(format!("unknown time zone '{name}'"))),
    }
}
