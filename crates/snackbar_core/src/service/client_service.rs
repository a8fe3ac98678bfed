//! Clients screen: registry of clients that may buy on credit.

use super::{fail, matches_search, ServiceError, ServiceResult};
use crate::messaging::{AppMessage, MessageBus};
use crate::model::client::Client;
use crate::model::RecordId;
use crate::repo::client_repo::SqliteClientRepository;
use crate::repo::Repository;
use log::info;
use rusqlite::Connection;

const MODULE: &str = "clients";

/// Editable client fields. `id == 0` saves a new client.
///
/// The outstanding balance is not editable here: only credit sales and
/// recorded payments move it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientForm {
    pub id: RecordId,
    pub name: String,
    pub phone: String,
    pub observations: Option<String>,
}

impl ClientForm {
    pub fn from_client(client: &Client) -> Self {
        Self {
            id: client.id,
            name: client.name.clone(),
            phone: client.phone.clone().unwrap_or_default(),
            observations: client.observations.clone(),
        }
    }

    fn apply_to(&self, client: &mut Client) {
        client.name = self.name.trim().to_string();
        client.phone = Some(self.phone.trim().to_string());
        client.observations = self
            .observations
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
    }
}

pub struct ClientService {
    bus: MessageBus,
    clients: Vec<Client>,
    search_text: String,
}

impl ClientService {
    pub fn new(bus: MessageBus) -> Self {
        Self {
            bus,
            clients: Vec::new(),
            search_text: String::new(),
        }
    }

    pub fn load(&mut self, conn: &Connection) -> ServiceResult<()> {
        match SqliteClientRepository::new(conn).list_active() {
            Ok(clients) => {
                self.clients = clients;
                Ok(())
            }
            Err(err) => fail(&self.bus, MODULE, "load clients", err),
        }
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    pub fn filtered(&self) -> Vec<&Client> {
        self.clients
            .iter()
            .filter(|client| matches_search(&client.name, &self.search_text))
            .collect()
    }

    /// Inserts (`form.id == 0`) or updates a client and returns its id.
    pub fn save(&mut self, conn: &Connection, form: &ClientForm) -> ServiceResult<RecordId> {
        let is_new = form.id == 0;
        let id = match save_client(conn, form) {
            Ok(id) => id,
            Err(err) => return fail(&self.bus, MODULE, "save client", err),
        };

        info!("event=client_save module={MODULE} status=ok client_id={id} is_new={is_new}");
        self.bus.status_ok(if is_new {
            "Client registered successfully!"
        } else {
            "Client updated successfully!"
        });
        self.bus.publish(AppMessage::ClientsChanged);
        let _ = self.load(conn);
        Ok(id)
    }

    /// Soft-deletes a client; their orders and balance stay on record.
    pub fn deactivate(&mut self, conn: &Connection, id: RecordId) -> ServiceResult<()> {
        if let Err(err) = SqliteClientRepository::new(conn).set_active(id, false) {
            return fail(&self.bus, MODULE, "remove client", err);
        }

        info!("event=client_deactivate module={MODULE} status=ok client_id={id}");
        self.clients.retain(|client| client.id != id);
        self.bus.status_ok("Client removed successfully!");
        self.bus.publish(AppMessage::ClientsChanged);
        Ok(())
    }
}

fn save_client(conn: &Connection, form: &ClientForm) -> ServiceResult<RecordId> {
    let repo = SqliteClientRepository::new(conn);
    if form.id == 0 {
        let mut client = Client::new(String::new(), String::new());
        form.apply_to(&mut client);
        return Ok(repo.add(&client)?);
    }

    let mut client = repo.get_by_id(form.id)?.ok_or(ServiceError::NotFound {
        entity: "client",
        id: form.id,
    })?;
    form.apply_to(&mut client);
    repo.update(&client)?;
    Ok(client.id)
}
