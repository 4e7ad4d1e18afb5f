//! Fake handler connections shared by this crate's tests.

use crate::connection::{Connector, DispatchMode, HandlerConnection};
use crate::error::{ConnectError, DispatchError};
use crate::package::{Pkg, PkgConfig, Trigger, Vocab};
use async_trait::async_trait;
use parley_conversation::{Msg, RespMsg};
use std::sync::{Arc, Mutex};

/// Connection that answers every call with `"<label> <operation>"`.
pub struct FakeConnection {
    pub label: String,
    pub fail_with: Option<DispatchError>,
    pub calls: Mutex<Vec<(DispatchMode, String)>>,
}

impl FakeConnection {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            fail_with: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(label: &str, error: DispatchError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::new(label)
        }
    }

    fn answer(&self, mode: DispatchMode, msg: &Msg) -> Result<RespMsg, DispatchError> {
        self.calls
            .lock()
            .unwrap()
            .push((mode, msg.sentence.clone()));
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(RespMsg::new(msg.id, format!("{} {mode}", self.label))),
        }
    }
}

#[async_trait]
impl HandlerConnection for FakeConnection {
    async fn run(&self, msg: &Msg) -> Result<RespMsg, DispatchError> {
        self.answer(DispatchMode::Run, msg)
    }

    async fn follow_up(&self, msg: &Msg) -> Result<RespMsg, DispatchError> {
        self.answer(DispatchMode::FollowUp, msg)
    }
}

/// Connector that labels each connection with the endpoint it dialed.
#[derive(Default)]
pub struct FakeConnector {
    pub refuse: bool,
    pub dialed: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        config: &PkgConfig,
        endpoint: &str,
    ) -> Result<Arc<dyn HandlerConnection>, ConnectError> {
        self.dialed.lock().unwrap().push(endpoint.to_string());
        if self.refuse {
            return Err(ConnectError {
                address: endpoint.to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(Arc::new(FakeConnection::new(&format!(
            "{}@{endpoint}",
            config.name
        ))))
    }
}

/// Builds a registration request.
pub fn pkg(name: &str, port: u16, commands: &[&str], objects: &[&str]) -> Pkg {
    Pkg {
        config: PkgConfig {
            name: name.to_string(),
            server_address: "127.0.0.1".to_string(),
            port,
        },
        trigger: Trigger {
            commands: commands.iter().map(|c| c.to_string()).collect(),
            objects: objects.iter().map(|o| o.to_string()).collect(),
        },
        vocab: None::<Vocab>,
    }
}
