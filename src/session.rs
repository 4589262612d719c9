use std::io::Write as _;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::db::PersistQueue;
use crate::generation::{generate_batch, GenerationSettings, ImageGenerator};
use crate::handlers::commands::{parse_command, Command, HELP_TEXT};
use crate::handlers::responses::{
    render_examples, render_form, render_generation, render_history, render_options,
    render_presets, render_prompt_history, render_status, RATE_TO_BLUEPRINT,
};
use crate::state::collections::filter_prompt_history;
use crate::state::{reduce, Action, AppState, BatchRequest, Capabilities, Effect, Transition};
use crate::utils::timing::BatchTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// What to print once an accepted action has been reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Echo {
    Nothing,
    Form,
    Generation,
    Saved,
}

fn echo_for(action: &Action) -> Echo {
    match action {
        Action::SetBasePrompt(_)
        | Action::SetParameter(_)
        | Action::ToggleVariation(_)
        | Action::SetTemperature(_)
        | Action::SetSeed(_)
        | Action::LoadConfig(_)
        | Action::LoadPreset(_)
        | Action::LoadPrompt(_)
        | Action::LoadExample(_) => Echo::Form,
        Action::SelectGeneration(_) | Action::RateImage { .. } => Echo::Generation,
        Action::SavePreset { .. } | Action::DeletePreset(_) | Action::DeletePrompt(_) => Echo::Saved,
        Action::Submit
        | Action::GenerationSucceeded { .. }
        | Action::GenerationFailed { .. }
        | Action::DismissError => Echo::Nothing,
    }
}

/// Owns the application state and runs reducer effects. Batch results come
/// back through `events` and are reduced on the same task as user input.
pub struct Session {
    state: AppState,
    caps: Capabilities,
    generator: Arc<dyn ImageGenerator>,
    persist: PersistQueue,
    events_tx: mpsc::UnboundedSender<Action>,
    events_rx: mpsc::UnboundedReceiver<Action>,
}

impl Session {
    pub fn new(
        state: AppState,
        caps: Capabilities,
        generator: Arc<dyn ImageGenerator>,
        persist: PersistQueue,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Session {
            state,
            caps,
            generator,
            persist,
            events_tx,
            events_rx,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Reduces one action and runs its effects. Returns the rejection message, if any.
    async fn apply(&mut self, action: Action) -> Option<String> {
        let current = std::mem::take(&mut self.state);
        let Transition {
            state,
            effects,
            rejected,
        } = reduce(current, action, &self.caps);
        self.state = state;

        for effect in effects {
            match effect {
                Effect::Persist(key) => self.persist.enqueue(&self.state, key).await,
                Effect::Dispatch(request) => self.dispatch(request),
            }
        }
        rejected.map(|reason| reason.to_string())
    }

    fn dispatch(&self, request: BatchRequest) {
        println!(
            "Generating {} image(s) for \"{}\"...",
            request.prompts.len(),
            request.config.base_prompt
        );
        let generator = Arc::clone(&self.generator);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let mut timer = BatchTimer::start(
                &request.request_id,
                request.config.parameter.as_str(),
                request.prompts.len(),
            );
            let settings = GenerationSettings {
                temperature: request.config.temperature,
                seed: request.config.seed,
            };
            let action = match generate_batch(generator.as_ref(), &request.prompts, settings).await
            {
                Ok(payloads) => {
                    timer.complete("success", None);
                    Action::GenerationSucceeded { request, payloads }
                }
                Err(err) => {
                    let detail = err.to_string();
                    timer.complete("error", Some(detail.clone()));
                    Action::GenerationFailed {
                        request_id: request.request_id,
                        detail,
                    }
                }
            };
            if events.send(action).is_err() {
                warn!("Session closed before a batch settled");
            }
        });
    }

    async fn on_completion(&mut self, action: Action) {
        match &action {
            Action::GenerationSucceeded { request, payloads } => info!(
                "Batch {} returned {} image(s)",
                request.request_id,
                payloads.len()
            ),
            Action::GenerationFailed { request_id, detail } => {
                error!("Batch {} failed: {}", request_id, detail)
            }
            _ => {}
        }

        if let Some(reason) = self.apply(action).await {
            warn!("Completion rejected: {}", reason);
        }
        self.print_display();
    }

    fn print_display(&self) {
        if let Some(error) = &self.state.error {
            println!("Error: {error}");
        } else if let Some(generation) = self.state.displayed_generation() {
            println!("{}", render_generation(generation));
        } else {
            println!("No generation to show.");
        }
    }

    async fn apply_and_echo(&mut self, action: Action) -> Result<()> {
        let echo = echo_for(&action);
        if let Some(reason) = self.apply(action).await {
            return Err(anyhow!(reason));
        }
        match echo {
            Echo::Nothing => {}
            Echo::Form => println!("{}", render_form(&self.state.form)),
            Echo::Generation => self.print_display(),
            Echo::Saved => println!("Saved."),
        }
        Ok(())
    }

    /// Parses and runs one command line. Parse errors and rejected actions come back as `Err`.
    pub async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        let command = parse_command(line)?;
        self.handle_command(command).await
    }

    async fn handle_command(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Apply(action) => self.apply_and_echo(action).await?,
            Command::Generate(config) => {
                self.apply_and_echo(Action::LoadConfig(config)).await?;
                self.apply_and_echo(Action::Submit).await?;
            }
            Command::ShowForm => println!("{}", render_form(&self.state.form)),
            Command::Options => println!("{}", render_options(&self.state.form)),
            Command::Presets => println!("{}", render_presets(&self.state.presets)),
            Command::Prompts(filter) => {
                let entries =
                    filter_prompt_history(&self.state.prompt_history, filter.as_deref().unwrap_or(""));
                println!("{}", render_prompt_history(&entries, filter.as_deref()));
            }
            Command::Examples => println!("{}", render_examples()),
            Command::History => {
                let displayed = self
                    .state
                    .displayed_generation()
                    .map(|generation| generation.id.as_str());
                println!("{}", render_history(&self.state.generations, displayed));
            }
            Command::Show => self.print_display(),
            Command::Blueprint(path) => match (self.state.blueprint(), path) {
                (None, _) => println!("{RATE_TO_BLUEPRINT}"),
                (Some(blueprint), None) => print!("{blueprint}"),
                (Some(blueprint), Some(path)) => {
                    if let Err(err) = tokio::fs::write(&path, &blueprint).await {
                        warn!("Failed to write blueprint to {}: {}", path.display(), err);
                        return Err(anyhow!("Could not write {}: {err}", path.display()));
                    }
                    println!("Blueprint written to {}", path.display());
                }
            },
            Command::Status => println!("{}", render_status(&self.state)),
            Command::Help => println!("{HELP_TEXT}"),
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Waits for every dispatched batch to come back.
    async fn settle(&mut self) {
        if self.state.is_loading() {
            info!("Waiting for {} batch(es) to finish", self.state.in_flight);
        }
        while self.state.is_loading() {
            match self.events_rx.recv().await {
                Some(action) => self.on_completion(action).await,
                None => break,
            }
        }
    }

    /// Runs a single command line, then waits for the batches it started.
    /// Fails when the command is rejected or the session ends with an active error.
    pub async fn run_once(&mut self, line: &str) -> Result<()> {
        self.handle_line(line).await?;
        self.settle().await;
        match &self.state.error {
            Some(error) => Err(anyhow!(error.clone())),
            None => Ok(()),
        }
    }

    pub async fn run_interactive(&mut self) -> Result<()> {
        println!("Aesthetic explorer. Type 'help' for commands.");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            print!("> ");
            let _ = std::io::stdout().flush();

            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => match self.handle_line(&line).await {
                            Ok(Flow::Quit) => break,
                            Ok(Flow::Continue) => {}
                            Err(err) => println!("{err}"),
                        },
                        None => break,
                    }
                }
                Some(action) = self.events_rx.recv() => {
                    println!();
                    self.on_completion(action).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        self.settle().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    use crate::db::{Database, KeyValueStore, StoreKey};
    use crate::generation::{GenerationError, ImagePayload};
    use crate::state::context::{FixedClock, SequentialIds};

    struct EchoGenerator;

    #[async_trait]
    impl ImageGenerator for EchoGenerator {
        async fn generate_image(
            &self,
            prompt: &str,
            _settings: GenerationSettings,
        ) -> Result<ImagePayload, GenerationError> {
            Ok(ImagePayload {
                mime_type: "image/png".to_string(),
                bytes: prompt.as_bytes().to_vec(),
            })
        }
    }

    struct DownGenerator;

    #[async_trait]
    impl ImageGenerator for DownGenerator {
        async fn generate_image(
            &self,
            _prompt: &str,
            _settings: GenerationSettings,
        ) -> Result<ImagePayload, GenerationError> {
            Err(GenerationError::Status {
                status: 503,
                detail: "overloaded".to_string(),
            })
        }
    }

    async fn session_with(
        generator: Arc<dyn ImageGenerator>,
    ) -> (Session, Arc<Database>, tokio::task::JoinHandle<()>) {
        let db = Arc::new(Database::init("sqlite::memory:").await.unwrap());
        let (persist, writer) = PersistQueue::spawn(db.clone(), 16);
        let caps = Capabilities {
            ids: Box::new(SequentialIds::new("s")),
            clock: Box::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())),
        };
        let state = AppState::new(0.5, Vec::new(), Vec::new(), Vec::new());
        (Session::new(state, caps, generator, persist), db, writer)
    }

    #[tokio::test]
    async fn one_shot_generate_persists_history_and_result() {
        let (mut session, db, writer) = session_with(Arc::new(EchoGenerator)).await;

        session
            .run_once("generate --prompt a cat --parameter style --variation Cyberpunk --variation Ukiyo-e")
            .await
            .unwrap();

        let generation = session.state().displayed_generation().unwrap().clone();
        let variations: Vec<&str> = generation.images.iter().map(|i| i.variation.as_str()).collect();
        assert_eq!(variations, vec!["Cyberpunk", "Ukiyo-e"]);
        assert_eq!(generation.images[0].prompt, "a cat, Style: Cyberpunk");

        drop(session);
        writer.await.unwrap();
        let stored = db.get(StoreKey::Generations.as_str()).await.unwrap().unwrap();
        assert!(stored.contains("\"basePrompt\":\"a cat\""));
        assert!(db.get(StoreKey::PromptHistory.as_str()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_batch_surfaces_the_error() {
        let (mut session, db, writer) = session_with(Arc::new(DownGenerator)).await;

        let err = session
            .run_once("generate --prompt a cat --parameter style --variation Cyberpunk")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("couldn't generate"));
        assert!(session.state().generations.is_empty());
        assert_eq!(session.state().prompt_history.len(), 1);
        assert_eq!(session.state().in_flight, 0);

        drop(session);
        writer.await.unwrap();
        assert!(db.get(StoreKey::Generations.as_str()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejected_commands_leave_state_alone() {
        let (mut session, _db, _writer) = session_with(Arc::new(EchoGenerator)).await;

        let err = session.handle_line("submit").await.unwrap_err();
        assert_eq!(err.to_string(), "Enter a base prompt first");
        assert!(session.state().prompt_history.is_empty());
        assert!(session.handle_line("load-preset missing").await.is_err());
        assert_eq!(session.handle_line("   ").await.unwrap(), Flow::Continue);
        assert_eq!(session.handle_line("quit").await.unwrap(), Flow::Quit);
    }

    #[tokio::test]
    async fn one_shot_fails_on_bad_input() {
        let (mut session, _db, _writer) = session_with(Arc::new(EchoGenerator)).await;

        for line in [
            "frobnicate",
            "rate x 9",
            "delete-preset nope",
            "generate --prompt a cat",
        ] {
            assert!(session.run_once(line).await.is_err(), "{line} should fail");
        }
        assert!(session.state().prompt_history.is_empty());
        assert!(session.run_once("status").await.is_ok());
    }

    #[tokio::test]
    async fn generate_rejects_out_of_range_temperature() {
        let (mut session, _db, _writer) = session_with(Arc::new(EchoGenerator)).await;

        for value in ["5", "NaN", "-0.1"] {
            let line = format!(
                "generate --prompt a cat --parameter style --variation Cyberpunk --temperature {value}"
            );
            assert!(session.run_once(&line).await.is_err(), "{value} should be rejected");
        }
        assert!(session.state().prompt_history.is_empty());
        assert!(session.state().generations.is_empty());
        assert_eq!(session.state().in_flight, 0);
    }

    #[tokio::test]
    async fn blueprint_is_written_to_a_file() {
        let (mut session, _db, _writer) = session_with(Arc::new(EchoGenerator)).await;
        session
            .run_once("generate --prompt a fox --parameter lighting --variation Neon glow")
            .await
            .unwrap();
        let image_id = session.state().generations[0].images[0].id.clone();
        session.handle_line(&format!("rate {image_id} 5")).await.unwrap();

        let path: PathBuf = std::env::temp_dir().join(format!("blueprint-{}.txt", uuid::Uuid::new_v4()));
        session
            .handle_line(&format!("blueprint {}", path.display()))
            .await
            .unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;
        assert_eq!(written, session.state().blueprint().unwrap());
        assert!(written.contains("Neon glow"));
    }
}
