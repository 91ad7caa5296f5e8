// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Calls `Notify(title, body, urgency)` on the managed user's agent,
//! discovered on the session bus at `org.guardian.Agent.<username>.*`.
//!
//! Discovery lists the bus's well-known names and picks the first one
//! matching the per-user prefix; the instance suffix after the username is
//! left to whatever the agent registers, per §4.5's "pinned interface plus
//! method, free discovery strategy" contract.

use super::{NotifyAdapter, NotifyError, Urgency};
use crate::env::agent_notify_timeout;
use async_trait::async_trait;
use guardian_core::Username;
use zbus::names::BusName;
use zbus::Connection;

const AGENT_INTERFACE: &str = "org.guardian.Agent1";

#[derive(Clone)]
pub struct DbusAgentNotifyAdapter {
    connection: Connection,
}

impl DbusAgentNotifyAdapter {
    pub async fn connect() -> zbus::Result<Self> {
        Ok(Self {
            connection: Connection::session().await?,
        })
    }

    async fn find_agent_name(&self, username: &str) -> Option<String> {
        let dbus = zbus::fdo::DBusProxy::new(&self.connection).await.ok()?;
        let names = dbus.list_names().await.ok()?;
        let prefix = format!("org.guardian.Agent.{username}.");
        let exact = format!("org.guardian.Agent.{username}");
        names
            .into_iter()
            .map(|n| n.to_string())
            .find(|n| n.starts_with(&prefix) || n == &exact)
    }
}

#[async_trait]
impl NotifyAdapter for DbusAgentNotifyAdapter {
    async fn notify(
        &self,
        username: &Username,
        title: &str,
        body: &str,
        urgency: Urgency,
    ) -> Result<(), NotifyError> {
        let Some(name) = self.find_agent_name(username.as_str()).await else {
            return Err(NotifyError::NoAgent(username.as_str().to_string()));
        };
        let bus_name = BusName::try_from(name.clone())
            .map_err(|e| NotifyError::SendFailed(format!("invalid bus name {name}: {e}")))?;

        let call = self.connection.call_method(
            Some(bus_name),
            "/org/guardian/Agent",
            Some(AGENT_INTERFACE),
            "Notify",
            &(title, body, urgency as u8),
        );

        tokio::time::timeout(agent_notify_timeout(), call)
            .await
            .map_err(|_| NotifyError::SendFailed("agent notify timed out".into()))?
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?;

        Ok(())
    }
}
