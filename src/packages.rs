//! Burial service package catalog.
//!
//! Packages are the price source for a booking: the booking total is the sum
//! of its selected package prices.

use crate::error::{DomainError, Result};
use crate::store::CemeteryStore;
use crate::types::{Money, Package, PackageId};
use std::sync::Arc;

/// Catalog over the package table.
#[derive(Clone)]
pub struct PackageCatalog {
    store: Arc<dyn CemeteryStore>,
}

impl PackageCatalog {
    /// Creates a catalog over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn CemeteryStore>) -> Self {
        Self { store }
    }

    /// Fetch a package by id.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] if the package does not exist.
    pub async fn get(&self, id: PackageId) -> Result<Package> {
        self.store
            .package(id)
            .await?
            .ok_or_else(|| DomainError::not_found("package", id))
    }

    /// List packages; `only_active` restricts to currently offered ones.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Storage`] on datastore failure.
    pub async fn list(&self, only_active: bool) -> Result<Vec<Package>> {
        self.store.packages(only_active).await
    }

    /// Total price of a package selection.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Validation`] if the selection is empty, repeats a
    ///   package, names an inactive package, or the sum overflows.
    /// - [`DomainError::NotFound`] if any package does not exist.
    pub async fn price_total(&self, ids: &[PackageId]) -> Result<Money> {
        if ids.is_empty() {
            return Err(DomainError::validation(
                "at least one package must be selected",
            ));
        }
        let mut total = Money::ZERO;
        let mut seen = std::collections::HashSet::new();
        for id in ids {
            if !seen.insert(*id) {
                return Err(DomainError::validation(format!(
                    "package {id} selected more than once"
                )));
            }
            let package = self.get(*id).await?;
            if !package.active {
                return Err(DomainError::validation(format!(
                    "package {} is no longer offered",
                    package.name
                )));
            }
            total = total
                .checked_add(package.price)
                .ok_or_else(|| DomainError::validation("package total overflows"))?;
        }
        Ok(total)
    }

    /// Add a package to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] if the name is empty.
    pub async fn create(&self, package: Package) -> Result<Package> {
        if package.name.trim().is_empty() {
            return Err(DomainError::validation("package name must not be empty"));
        }
        self.store.insert_package(&package).await?;
        Ok(package)
    }

    /// Overwrite a package's details.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] if the package does not exist.
    pub async fn update(&self, package: Package) -> Result<Package> {
        self.store.update_package(&package).await?;
        Ok(package)
    }
}
