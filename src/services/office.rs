//! Employees and supplier invoices.

use tracing::instrument;
use validator::Validate;

use crate::domain::aggregates::{Employee, EmployeeInput, Invoice, InvoiceInput};
use crate::store::{Store, StoreTx};
use crate::{Result, WarehouseError};

#[derive(Clone)]
pub struct OfficeService<S> { store: S }

impl<S: Store> OfficeService<S> {
    pub fn new(store: S) -> Self { Self { store } }

    // -------------------------------------------------------------------------
    // Employees
    // -------------------------------------------------------------------------

    pub async fn list_employees(&self) -> Result<Vec<Employee>> { self.store.list_employees().await }

    pub async fn get_employee(&self, id: i64) -> Result<Employee> {
        self.store.find_employee(id).await?.ok_or(WarehouseError::NotFound("Employee"))
    }

    #[instrument(skip(self, input), fields(full_name = %input.full_name))]
    pub async fn create_employee(&self, input: EmployeeInput) -> Result<Employee> {
        input.validate()?;
        let mut tx = self.store.begin().await?;
        let employee = tx.insert_employee(&input).await?;
        tx.commit().await?;
        tracing::info!(employee_id = employee.id, "employee created");
        Ok(employee)
    }

    #[instrument(skip(self, input))]
    pub async fn update_employee(&self, id: i64, input: EmployeeInput) -> Result<Employee> {
        input.validate()?;
        let mut tx = self.store.begin().await?;
        let employee = tx.update_employee(id, &input).await?.ok_or(WarehouseError::NotFound("Employee"))?;
        tx.commit().await?;
        Ok(employee)
    }

    #[instrument(skip(self))]
    pub async fn delete_employee(&self, id: i64) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if tx.delete_employee(id).await? == 0 {
            return Err(WarehouseError::NotFound("Employee"));
        }
        tx.commit().await?;
        tracing::info!(employee_id = id, "employee deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Invoices
    // -------------------------------------------------------------------------

    pub async fn list_invoices(&self) -> Result<Vec<Invoice>> { self.store.list_invoices().await }

    pub async fn get_invoice(&self, id: i64) -> Result<Invoice> {
        self.store.find_invoice(id).await?.ok_or(WarehouseError::NotFound("Invoice"))
    }

    #[instrument(skip(self, input), fields(invoice_number = %input.invoice_number))]
    pub async fn create_invoice(&self, input: InvoiceInput) -> Result<Invoice> {
        input.validate()?;
        let mut tx = self.store.begin().await?;
        let id = tx.insert_invoice(&input).await?;
        let invoice = tx.find_invoice(id).await?.ok_or(WarehouseError::NotFound("Invoice"))?;
        tx.commit().await?;
        tracing::info!(invoice_id = id, total = %invoice.total_amount, "invoice created");
        Ok(invoice)
    }

    #[instrument(skip(self, input), fields(invoice_number = %input.invoice_number))]
    pub async fn update_invoice(&self, id: i64, input: InvoiceInput) -> Result<Invoice> {
        input.validate()?;
        let mut tx = self.store.begin().await?;
        if tx.update_invoice(id, &input).await? == 0 {
            return Err(WarehouseError::NotFound("Invoice"));
        }
        let invoice = tx.find_invoice(id).await?.ok_or(WarehouseError::NotFound("Invoice"))?;
        tx.commit().await?;
        Ok(invoice)
    }

    #[instrument(skip(self))]
    pub async fn delete_invoice(&self, id: i64) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if tx.delete_invoice(id).await? == 0 {
            return Err(WarehouseError::NotFound("Invoice"));
        }
        tx.commit().await?;
        tracing::info!(invoice_id = id, "invoice deleted");
        Ok(())
    }
}
