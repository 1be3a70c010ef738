use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::Marketplace;
use crate::booking::{Booking, BookingSource, GuestInfo};
use crate::error::{StaybookError, StaybookResult};
use crate::invoice::{Invoice, NewInvoice, PaymentInfo};
use crate::job::{self, DEFAULT_LIST_LIMIT, JobDraft, JobListing, JobPage, JobQuery};
use crate::party::{Employer, Owner, PartyDraft};
use crate::pricing::Pricing;
use crate::property::{NewProperty, Property, PropertyPatch, PropertyStatus};
use crate::store::{Document, merge_fields};

/// Fields an update body can never overwrite.
const IMMUTABLE_FIELDS: &[&str] = &["id", "created_at"];

impl Marketplace {
    // Properties

    pub async fn create_property(&self, new: NewProperty) -> StaybookResult<Property> {
        let mut property = new.into_property()?;
        let _guard = self.locks.acquire(&property.id).await;
        self.store_available_dates(&mut property).await?;
        info!(property = %property.id, title = %property.title, "property created");
        Ok(property)
    }

    pub async fn property(&self, id: &str) -> StaybookResult<Property> {
        self.store.fetch(id).await
    }

    /// All properties, or only published ones.
    pub async fn properties(&self, include_drafts: bool) -> StaybookResult<Vec<Property>> {
        let mut properties: Vec<Property> = self.store.list().await?;
        if !include_drafts {
            properties.retain(Property::is_published);
        }
        Ok(properties)
    }

    /// Apply a patch. Moving the window or zone, or changing the feed list,
    /// rereads the feeds before dates are recomputed, since cached spans only
    /// cover the window they were read for.
    pub async fn update_property(&self, id: &str, patch: PropertyPatch) -> StaybookResult<Property> {
        let _guard = self.locks.acquire(id).await;
        let mut property: Property = self.store.fetch(id).await?;
        let before = property.clone();
        property.apply(patch)?;

        if property.feed_view_changed(&before) && !property.ical_urls.is_empty() {
            let (fetched, feed_errors) = self.fetch_feeds(&property).await?;
            property.external_busy.extend(fetched);
            property.last_refreshed_at = Some(Utc::now());
            if !feed_errors.is_empty() {
                warn!(
                    property = %property.id,
                    failed_feeds = feed_errors.len(),
                    "feeds unreadable after update; cached spans kept"
                );
            }
        }
        self.store_available_dates(&mut property).await?;
        Ok(property)
    }

    pub async fn set_property_status(
        &self,
        id: &str,
        status: PropertyStatus,
    ) -> StaybookResult<Property> {
        let _guard = self.locks.acquire(id).await;
        let mut property: Property = self.store.fetch(id).await?;
        property.status = status;
        property.updated_at = Utc::now();
        self.store.put(&property).await?;
        info!(property = %property.id, ?status, "property status changed");
        Ok(property)
    }

    /// Delete a property that has no active bookings.
    pub async fn delete_property(&self, id: &str) -> StaybookResult<()> {
        {
            let _guard = self.locks.acquire(id).await;
            self.store.fetch::<Property>(id).await?;
            let active = self.holding_bookings(id).await?;
            if !active.is_empty() {
                return Err(StaybookError::Conflict(format!(
                    "property {id} still has {} active booking(s)",
                    active.len()
                )));
            }
            self.store.delete::<Property>(id).await?;
        }
        self.locks.forget(id);
        info!(property = %id, "property deleted");
        Ok(())
    }

    // Invoices

    pub async fn create_invoice(&self, new: NewInvoice) -> StaybookResult<Invoice> {
        if let Some(property_id) = &new.property_id {
            self.store.fetch::<Property>(property_id).await?;
        }
        let invoice = new.into_invoice()?;
        self.store.put(&invoice).await?;
        info!(invoice = %invoice.id, amount = invoice.amount, "invoice created");
        Ok(invoice)
    }

    /// An invoice with its overdue status brought up to date.
    pub async fn invoice(&self, id: &str) -> StaybookResult<Invoice> {
        let mut invoice: Invoice = self.store.fetch(id).await?;
        invoice.refresh_status(Utc::now().date_naive());
        Ok(invoice)
    }

    /// Every invoice, earliest due first.
    pub async fn invoices(&self) -> StaybookResult<Vec<Invoice>> {
        let today = Utc::now().date_naive();
        let mut invoices: Vec<Invoice> = self.store.list().await?;
        for invoice in &mut invoices {
            invoice.refresh_status(today);
        }
        invoices.sort_by(|a, b| (a.due_date, &a.id).cmp(&(b.due_date, &b.id)));
        Ok(invoices)
    }

    /// Settle an invoice. When it names a property its nights are booked,
    /// which fails with a conflict if any of them is taken.
    pub async fn pay_invoice(&self, id: &str, payment: PaymentInfo) -> StaybookResult<Invoice> {
        let invoice: Invoice = self.store.fetch(id).await?;
        let Some(property_id) = invoice.property_id.clone() else {
            let mut invoice = invoice;
            invoice.mark_paid(payment)?;
            self.store.put(&invoice).await?;
            info!(invoice = %invoice.id, "invoice paid");
            return Ok(invoice);
        };

        let _guard = self.locks.acquire(&property_id).await;
        let mut invoice: Invoice = self.store.fetch(id).await?;
        // Its own booking would otherwise read as a clash.
        invoice.ensure_unpaid()?;
        let stay = invoice.stay()?;
        let property: Property = self.store.fetch(&property_id).await?;

        let busy = self.busy_spans(&property).await?;
        if let Some(taken) = busy.iter().find(|span| span.overlaps(&stay)) {
            return Err(StaybookError::Conflict(format!(
                "nights from {} to {} are already taken at property {property_id}",
                taken.start.max(stay.start),
                taken.end.min(stay.end)
            )));
        }

        invoice.mark_paid(payment)?;

        let pricing = Pricing {
            nightly: BTreeMap::new(),
            cleaning_fee: 0,
            subtotal: invoice.amount,
            total: invoice.amount,
            currency: self.booking.currency.clone(),
        };
        let mut booking = Booking::new(
            property_id.clone(),
            GuestInfo {
                name: invoice.customer_name.clone(),
                email: String::new(),
                phone: None,
            },
            1,
            stay,
            pricing,
            BookingSource::Invoice,
        );
        booking.invoice_id = Some(invoice.id.clone());
        booking.confirm()?;
        invoice.booking_id = Some(booking.id.clone());

        self.store.put(&booking).await?;
        self.store.put(&invoice).await?;
        self.refresh_cached(&property_id).await?;

        info!(invoice = %invoice.id, booking = %booking.id, "invoice paid");
        Ok(invoice)
    }

    // Jobs

    pub async fn create_job(&self, draft: JobDraft) -> StaybookResult<JobListing> {
        if let Some(employer_id) = &draft.employer_id {
            self.store.fetch::<Employer>(employer_id).await?;
        }
        let job = draft.into_listing()?;
        self.store.put(&job).await?;
        info!(job = %job.id, title = %job.job_title, "job listed");
        Ok(job)
    }

    pub async fn job(&self, id: &str) -> StaybookResult<JobListing> {
        self.store.fetch(id).await
    }

    /// Newest listings first, at most `limit` (100 by default).
    pub async fn jobs(&self, limit: Option<usize>) -> StaybookResult<Vec<JobListing>> {
        let mut jobs: Vec<JobListing> = self.store.list().await?;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit.unwrap_or(DEFAULT_LIST_LIMIT));
        Ok(jobs)
    }

    pub async fn update_job(&self, id: &str, fields: Map<String, Value>) -> StaybookResult<JobListing> {
        let job: JobListing = self.store.fetch(id).await?;
        let job = merge_fields(&job, fields, IMMUTABLE_FIELDS)?;
        job.validate()?;
        self.store.put(&job).await?;
        Ok(job)
    }

    pub async fn delete_job(&self, id: &str) -> StaybookResult<()> {
        self.remove::<JobListing>(id).await
    }

    pub async fn search_jobs(&self, query: &JobQuery) -> StaybookResult<JobPage> {
        job::search(self.store.list().await?, query)
    }

    // Employers and owners

    pub async fn create_employer(&self, draft: PartyDraft) -> StaybookResult<Employer> {
        let employer = draft.into_employer()?;
        self.store.put(&employer).await?;
        Ok(employer)
    }

    pub async fn employer(&self, id: &str) -> StaybookResult<Employer> {
        self.store.fetch(id).await
    }

    pub async fn employers(&self) -> StaybookResult<Vec<Employer>> {
        self.store.list().await
    }

    pub async fn update_employer(&self, id: &str, fields: Map<String, Value>) -> StaybookResult<Employer> {
        let employer: Employer = self.store.fetch(id).await?;
        let employer = merge_fields(&employer, fields, IMMUTABLE_FIELDS)?;
        self.store.put(&employer).await?;
        Ok(employer)
    }

    pub async fn delete_employer(&self, id: &str) -> StaybookResult<()> {
        self.remove::<Employer>(id).await
    }

    pub async fn create_owner(&self, draft: PartyDraft) -> StaybookResult<Owner> {
        let owner = draft.into_owner()?;
        self.store.put(&owner).await?;
        Ok(owner)
    }

    pub async fn owner(&self, id: &str) -> StaybookResult<Owner> {
        self.store.fetch(id).await
    }

    pub async fn owners(&self) -> StaybookResult<Vec<Owner>> {
        self.store.list().await
    }

    pub async fn update_owner(&self, id: &str, fields: Map<String, Value>) -> StaybookResult<Owner> {
        let owner: Owner = self.store.fetch(id).await?;
        let owner = merge_fields(&owner, fields, IMMUTABLE_FIELDS)?;
        self.store.put(&owner).await?;
        Ok(owner)
    }

    pub async fn delete_owner(&self, id: &str) -> StaybookResult<()> {
        self.remove::<Owner>(id).await
    }

    async fn remove<T: Document>(&self, id: &str) -> StaybookResult<()> {
        if self.store.delete::<T>(id).await? {
            Ok(())
        } else {
            Err(StaybookError::not_found(T::KIND, id))
        }
    }
}
