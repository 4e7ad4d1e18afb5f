//! Fake collaborators shared by this crate's tests.

use async_trait::async_trait;
use parley_conversation::{Classification, Classifier, ClassifierError, Msg, RespMsg, StructuredInput};
use parley_dispatch::{
    ConnectError, Connector, DispatchError, DispatchMode, HandlerConnection, Pkg, PkgConfig,
    Trigger,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Classifier with canned answers per sentence.
#[derive(Default)]
pub struct CannedClassifier {
    answers: HashMap<String, StructuredInput>,
}

impl CannedClassifier {
    pub fn answer(mut self, sentence: &str, commands: &[&str], objects: &[&str]) -> Self {
        let pronouns = objects
            .iter()
            .filter(|o| matches!(**o, "it" | "that"))
            .map(|o| o.to_string())
            .collect();
        self.answers.insert(
            sentence.to_string(),
            StructuredInput {
                commands: commands.iter().map(|c| c.to_string()).collect(),
                objects: objects.iter().map(|o| o.to_string()).collect(),
                pronouns,
                ..Default::default()
            },
        );
        self
    }
}

#[async_trait]
impl Classifier for CannedClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        Ok(Classification {
            input: self.answers.get(text).cloned().unwrap_or_default(),
            annotated: text.to_string(),
            confidence: 1.0,
        })
    }
}

/// Turns the package saw, shared by every connection a connector opens.
pub type Seen = Arc<Mutex<Vec<(DispatchMode, Msg)>>>;

pub struct EchoConnection {
    pub name: String,
    pub fail: bool,
    pub seen: Seen,
}

impl EchoConnection {
    fn answer(&self, mode: DispatchMode, msg: &Msg) -> Result<RespMsg, DispatchError> {
        self.seen.lock().unwrap().push((mode, msg.clone()));
        if self.fail {
            return Err(DispatchError::Handler {
                package: self.name.clone(),
                message: "out of beans".to_string(),
            });
        }
        Ok(RespMsg::new(
            msg.id,
            format!("{} {mode}: {}", self.name, msg.structured_input.objects.join(",")),
        ))
    }
}

#[async_trait]
impl HandlerConnection for EchoConnection {
    async fn run(&self, msg: &Msg) -> Result<RespMsg, DispatchError> {
        self.answer(DispatchMode::Run, msg)
    }

    async fn follow_up(&self, msg: &Msg) -> Result<RespMsg, DispatchError> {
        self.answer(DispatchMode::FollowUp, msg)
    }
}

#[derive(Default)]
pub struct EchoConnector {
    pub fail: bool,
    pub seen: Seen,
}

#[async_trait]
impl Connector for EchoConnector {
    async fn connect(
        &self,
        config: &PkgConfig,
        _endpoint: &str,
    ) -> Result<Arc<dyn HandlerConnection>, ConnectError> {
        Ok(Arc::new(EchoConnection {
            name: config.name.clone(),
            fail: self.fail,
            seen: Arc::clone(&self.seen),
        }))
    }
}

pub fn pkg(name: &str, command: &str, object: &str) -> Pkg {
    Pkg {
        config: PkgConfig {
            name: name.to_string(),
            server_address: "127.0.0.1".to_string(),
            port: 4000,
        },
        trigger: Trigger {
            commands: vec![command.to_string()],
            objects: vec![object.to_string()],
        },
        vocab: None,
    }
}
