pub mod bank_service;
pub mod catalog_service;
pub mod import_service;
pub mod insumo_service;
pub mod item_service;
pub mod line_service;
pub mod module_service;

pub use bank_service::BankService;
pub use catalog_service::{CatalogField, CatalogService};
pub use import_service::{
    BankImportSummary, BudgetImportSummary, CatalogRow, ImportService, ImportRow,
};
pub use insumo_service::InsumoService;
pub use item_service::{ItemField, ItemService};
pub use line_service::{AddLineOutcome, LineField, LineService};
pub use module_service::ModuleService;

use crate::errors::{ApuError, GuardError};
use crate::project::{Apu, Project};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Apu(#[from] ApuError),
    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl From<GuardError> for ServiceError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::ConfirmationRequired(action) => ServiceError::ConfirmationRequired(action),
            GuardError::Rejected(reason) => ServiceError::Rejected(reason),
        }
    }
}

/// Addresses an APU by the collection that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApuRef {
    Budget(u64),
    Bank(u64),
}

impl ApuRef {
    pub fn resolve<'a>(&self, project: &'a Project) -> Option<&'a dyn Apu> {
        match *self {
            ApuRef::Budget(id) => project.item(id).map(|item| item as &dyn Apu),
            ApuRef::Bank(id) => project.bank_item(id).map(|item| item as &dyn Apu),
        }
    }

    pub fn resolve_mut<'a>(&self, project: &'a mut Project) -> Option<&'a mut dyn Apu> {
        match *self {
            ApuRef::Budget(id) => project.item_mut(id).map(|item| item as &mut dyn Apu),
            ApuRef::Bank(id) => project.bank_item_mut(id).map(|item| item as &mut dyn Apu),
        }
    }
}

/// Moves the element at `from` to position `to`, shifting the elements in
/// between. Out-of-range indexes leave the slice untouched.
pub(crate) fn move_element<T>(list: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= list.len() || to >= list.len() {
        return false;
    }
    if from != to {
        let element = list.remove(from);
        list.insert(to, element);
    }
    true
}
