use std::sync::Arc;

use domain::{Contact, ContactId, DomainError, UserEmail};
use uuid::Uuid;

use crate::{
    clock::Clock, dto::ContactDto, error::ApplicationError, repository::ContactRepository,
};

#[derive(Debug, Clone, Default)]
pub struct SubmitContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// 官网联系表单
pub struct ContactService {
    contacts: Arc<dyn ContactRepository>,
    clock: Arc<dyn Clock>,
}

impl ContactService {
    pub fn new(contacts: Arc<dyn ContactRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { contacts, clock }
    }

    pub async fn submit(&self, request: SubmitContactRequest) -> Result<ContactDto, ApplicationError> {
        let email = UserEmail::parse(request.email)?;
        let contact = Contact::submit(
            ContactId::generate(),
            request.name,
            email,
            request.message,
            self.clock.now(),
        )?;
        let stored = self.contacts.create(contact).await?;
        tracing::info!(contact_id = %stored.id, "contact message received");
        Ok(ContactDto::from(stored))
    }

    pub async fn list(&self, unread_only: bool) -> Result<Vec<ContactDto>, ApplicationError> {
        let contacts = self.contacts.list(unread_only).await?;
        Ok(contacts.into_iter().map(ContactDto::from).collect())
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<ContactDto, ApplicationError> {
        let contact = self
            .contacts
            .mark_read(ContactId::from(id))
            .await?
            .ok_or(DomainError::ContactNotFound)?;
        Ok(ContactDto::from(contact))
    }
}
