//! Per-process bot state and command handlers.
//!
//! Frames are handled one at a time: a command is fully rendered and uploaded
//! before the next frame is read, so the state here needs no locking.

use crate::attachment::AttachmentCache;
use crate::commands::{CommandKind, CooldownGate, HELP_TEXT, ParsedCommand, parse_command};
use crate::config::Config;
use crate::error::Result;
use crate::imageboard::Imageboard;
use crate::numbers::NumberSpec;
use crate::protocol::{ChatMessage, InboundFrame, OutboundFrame, RoomId};
use crate::render::{RenderRequest, Renderer};
use crate::roster::Roster;
use crate::session::Session;
use crate::text::clean_caption;
use crate::upload::{UploadClient, Uploader};

use anyhow::{Context as _, anyhow};
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom as _;
use rand::{Rng, SeedableRng as _};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Upper bound for `when`: half a century of days.
const MAX_DEATH_DAYS: u64 = 36525 / 2;

const RANDOM_CAPTION: &str = "[Random] [Random]";

/// Outbound frame queue drained by the socket writer.
pub type Outbox = mpsc::Sender<OutboundFrame>;

/// Shared state for one bot process: session, roster, last attachment, cooldown.
pub struct Bot<U: Uploader = UploadClient> {
    config: Arc<Config>,
    http: reqwest::Client,
    session: Option<Session>,
    roster: Roster,
    attachments: AttachmentCache,
    gate: CooldownGate,
    renderer: Renderer,
    imageboard: Imageboard,
    uploader: U,
    rng: StdRng,
}

impl<U: Uploader> Bot<U> {
    pub fn new(config: Arc<Config>, http: reqwest::Client, uploader: U) -> Self {
        let imageboard = Imageboard::new(
            http.clone(),
            config.imageboard_api.clone(),
            config.boards.clone(),
        );
        Self {
            gate: CooldownGate::new(config.cooldown),
            renderer: Renderer::new(&config.renderer),
            session: None,
            roster: Roster::new(),
            attachments: AttachmentCache::new(),
            rng: StdRng::from_os_rng(),
            imageboard,
            uploader,
            http,
            config,
        }
    }

    /// Replace the credentials after a (re)login.
    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// Forget presence state; the next `loadUsers` rebuilds it.
    pub fn reset_roster(&mut self) {
        self.roster.clear();
    }

    /// Handle one raw text frame from the socket.
    pub async fn handle_text(&mut self, text: &str, outbox: &Outbox) {
        if let Some(frame) = InboundFrame::parse(text) {
            self.handle_frame(&frame, outbox).await;
        }
    }

    pub async fn handle_frame(&mut self, frame: &InboundFrame, outbox: &Outbox) {
        self.roster.apply(frame);

        if let InboundFrame::Files {
            data: Some(payload),
        } = frame
            && self
                .attachments
                .observe(payload, &self.config.username, &self.config.base_url)
        {
            tracing::debug!(author = ?payload.name, "remembered attachment");
        }

        if let Some((chat, room_id)) = frame.chat() {
            self.handle_chat(chat, room_id, outbox).await;
        }
    }

    /// Gate, filter, and dispatch a chat message. Returns the command that ran, if any.
    pub async fn handle_chat(
        &mut self,
        chat: &ChatMessage,
        room_id: &RoomId,
        outbox: &Outbox,
    ) -> Option<CommandKind> {
        if self.gate.blocked() {
            return None;
        }
        if chat.name == self.config.username {
            return None;
        }
        let command = parse_command(&chat.text, &self.config.prefix)?;

        // A recognized command consumes the window even if the handler bails out.
        self.gate.touch();
        tracing::info!(command = %command.kind, %room_id, user = %chat.name, "running command");

        if let Err(error) = self.run(&command, room_id, outbox).await {
            tracing::warn!(command = %command.kind, %room_id, %error, "command failed");
        }
        Some(command.kind)
    }

    async fn run(&mut self, command: &ParsedCommand, room_id: &RoomId, outbox: &Outbox) -> Result<()> {
        let args = command.args.as_deref();

        match command.kind {
            CommandKind::Ping => say(outbox, room_id, "Pong!").await,
            CommandKind::Help => say(outbox, room_id, HELP_TEXT).await,
            CommandKind::Describe => {
                let Some(who) = args else {
                    tracing::debug!("describe needs a subject");
                    return Ok(());
                };
                let request = RenderRequest::new(
                    self.config.asset("describe.jpg"),
                    format!("{} is\\n[Random] [x5]", clean_caption(who)),
                )
                .option("--filter", "anyhue2")
                .option("--opacity", 0.8)
                .option("--fontsize", 66)
                .option("--delay", 700)
                .option("--padding", 50)
                .option("--fontcolor", "light2")
                .option("--bgcolor", "black");
                self.render_and_upload(&request, room_id).await
            }
            CommandKind::Wins => {
                let who = self.subject(args)?;
                let request = RenderRequest::new(
                    self.config.asset("wins.gif"),
                    format!("{who} wins a ; [repeat] ; [RANDOM] ; [repeat]"),
                )
                .option("--bgcolor", "0,0,0")
                .option("--bottom", 20)
                .option("--filter", "anyhue2")
                .option("--framelist", "11,11,33,33")
                .option("--fontsize", 42);
                self.render_and_upload(&request, room_id).await
            }
            CommandKind::Numbers => {
                let cleaned = args.map(clean_caption);
                let Some(number) = NumberSpec::parse(cleaned.as_deref()).pick(&mut self.rng) else {
                    tracing::debug!(args = ?cleaned, "empty number range");
                    return Ok(());
                };
                let request = RenderRequest::new(self.config.asset("numbers.png"), number.to_string())
                    .option("--top", 20)
                    .option("--fontcolor", "0,0,0")
                    .option("--fontsize", 66)
                    .option("--format", "jpg");
                self.render_and_upload(&request, room_id).await
            }
            CommandKind::Date => {
                let request = RenderRequest::new(
                    self.config.asset("time.jpg"),
                    "Date: [date %A %d] ; [repeat] ; Time: [date %I:%M %p] ; [repeat]",
                )
                .option("--filter", "anyhue2")
                .option("--bottom", 20)
                .option("--bgcolor", "0,0,0")
                .option("--fontsize", 80);
                self.render_and_upload(&request, room_id).await
            }
            CommandKind::Who => {
                let who = self.subject(args)?;
                let verdict = ["based", "cringe"]
                    .choose(&mut self.rng)
                    .copied()
                    .unwrap_or("based");
                let request = RenderRequest::new(
                    self.config.asset("nerd.jpg"),
                    format!("{who} is [x2] ; {verdict} [x2]"),
                )
                .option("--filter", "anyhue2")
                .option("--bottom", 20)
                .option("--fontcolor", "light2")
                .option("--bgcolor", "darkfont2")
                .option("--outline", "font")
                .flag("--deepfry")
                .option("--font", "nova")
                .option("--fontsize", 45)
                .option("--opacity", 0.8);
                self.render_and_upload(&request, room_id).await
            }
            CommandKind::When => {
                let who = self.subject(args)?;
                let today = chrono::Local::now().date_naive();
                let date = random_death_date(&mut self.rng, today);
                let request = RenderRequest::new(
                    self.config.asset("sky.jpg"),
                    format!("{who} will die [x2] ; {date} [x2]"),
                )
                .option("--filter", "anyhue2")
                .option("--bottom", 66)
                .option("--fontcolor", "light2")
                .option("--bgcolor", "darkfont2")
                .option("--outline", "font")
                .option("--font", "nova")
                .option("--fontsize", 70)
                .option("--opacity", 0.8)
                .option("--wrap", 25);
                self.render_and_upload(&request, room_id).await
            }
            CommandKind::Bird => {
                let birds = tokio::fs::read_to_string(&self.config.word_list)
                    .await
                    .with_context(|| {
                        format!("failed to read word list {}", self.config.word_list.display())
                    })?;
                let bird = random_line(&birds, &mut self.rng).context("word list is empty")?;
                say(outbox, room_id, format!(".i \"{bird}\" bird")).await
            }
            CommandKind::Shitpost => {
                let post = self.imageboard.random_post(&mut self.rng).await?;
                say(outbox, room_id, post).await
            }
            CommandKind::Meme | CommandKind::Video => {
                self.caption_attachment(command.kind, args, room_id, outbox).await
            }
        }
    }

    /// Caption the last seen image or video.
    async fn caption_attachment(
        &mut self,
        kind: CommandKind,
        args: Option<&str>,
        room_id: &RoomId,
        outbox: &Outbox,
    ) -> Result<()> {
        let Some(attachment) = self.attachments.last().cloned() else {
            tracing::debug!(command = %kind, "no attachment to caption");
            return Ok(());
        };

        let progress = if kind == CommandKind::Video {
            "Generating video..."
        } else {
            "Generating gif..."
        };
        say(outbox, room_id, progress).await?;

        let source = attachment.download(&self.http).await?;

        let request = RenderRequest::new(source.to_path_buf(), caption_words(args))
            .option("--filter", "anyhue2")
            .option("--opacity", 0.8)
            .option("--fontsize", 60)
            .option("--delay", if kind == CommandKind::Video { 600 } else { 700 })
            .option("--padding", 30)
            .option("--fontcolor", "light2")
            .option("--bgcolor", "black")
            .option("--bottom", 30)
            .option("--font", "nova")
            .option("--frames", if kind == CommandKind::Video { 18 } else { 3 })
            .flag("--fillgen")
            .option("--word-color-mode", "random");
        let request = if kind == CommandKind::Video {
            request
                .option("--width", 600)
                .option("--output", "/tmp/gifmaker.webm")
        } else {
            request
        };

        let result = self.render_and_upload(&request, room_id).await;
        if let Err(error) = source.close() {
            tracing::warn!(%error, "failed to remove downloaded attachment");
        }
        result
    }

    /// Render, then hand the output to the uploader. Nothing is uploaded on failure.
    async fn render_and_upload(&self, request: &RenderRequest, room_id: &RoomId) -> Result<()> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| anyhow!("not authenticated"))?;
        let output = self.renderer.render(request).await?;
        self.uploader.upload(session, &output, room_id).await
    }

    /// The named subject, or a random room member.
    fn subject(&mut self, args: Option<&str>) -> Result<String> {
        match args {
            Some(who) => Ok(clean_caption(who)),
            None => self
                .roster
                .random_member(&mut self.rng)
                .map(|name| clean_caption(&name))
                .ok_or_else(|| anyhow!("roster is empty").into()),
        }
    }
}

async fn say(outbox: &Outbox, room_id: &RoomId, text: impl Into<String>) -> Result<()> {
    outbox
        .send(OutboundFrame::message(text, room_id.clone()))
        .await
        .map_err(|_| anyhow!("outbound channel closed"))?;
    Ok(())
}

/// Caption for meme/video: the argument, a double random placeholder, or nothing.
fn caption_words(args: Option<&str>) -> String {
    match args.map(clean_caption) {
        Some(words) if words == "random" => RANDOM_CAPTION.to_string(),
        Some(words) => words,
        None => String::new(),
    }
}

fn random_line<'a, R: Rng + ?Sized>(content: &'a str, rng: &mut R) -> Option<&'a str> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    lines.choose(rng).copied()
}

/// A date up to fifty years after `today`, formatted like `07 Mar 2051`.
fn random_death_date<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> String {
    let offset = rng.random_range(0..=MAX_DEATH_DAYS);
    today
        .checked_add_days(Days::new(offset))
        .unwrap_or(today)
        .format("%d %b %Y")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileConfig;
    use httpmock::prelude::*;
    use rand::SeedableRng as _;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records upload calls instead of posting.
    #[derive(Default, Clone)]
    struct RecordingUploader {
        calls: Arc<Mutex<Vec<(PathBuf, RoomId)>>>,
    }

    impl Uploader for RecordingUploader {
        async fn upload(&self, _session: &Session, path: &Path, room_id: &RoomId) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((path.to_path_buf(), room_id.clone()));
            Ok(())
        }
    }

    fn config(cooldown_secs: u64, renderer_script: &str, assets: &Path) -> Arc<Config> {
        config_at("https://deek.chat", cooldown_secs, renderer_script, assets)
    }

    fn config_at(
        base_url: &str,
        cooldown_secs: u64,
        renderer_script: &str,
        assets: &Path,
    ) -> Arc<Config> {
        let file: FileConfig = toml::from_str(&format!(
            r#"
            base_url = "{base_url}"
            cooldown_secs = {cooldown_secs}
            assets_dir = "{}"

            [renderer]
            command = ["sh", "-c", '{renderer_script}', "gifmaker"]
            render_timeout_secs = 10
            "#,
            assets.display()
        ))
        .unwrap();
        Arc::new(Config::from_parts(file, Some("gluebot".into()), Some("pw".into())).unwrap())
    }

    fn bot(config: Arc<Config>) -> (Bot<RecordingUploader>, RecordingUploader) {
        let uploader = RecordingUploader::default();
        let mut bot = Bot::new(config, reqwest::Client::new(), uploader.clone());
        bot.rng = StdRng::seed_from_u64(11);
        bot.set_session(Session::new("token", "session"));
        (bot, uploader)
    }

    /// Serve `name` from the mock chat server and announce it in a `files` frame.
    async fn seed_attachment<'a>(
        bot: &mut Bot<RecordingUploader>,
        server: &'a MockServer,
        name: &str,
        extension: &str,
        outbox: &Outbox,
    ) -> httpmock::Mock<'a> {
        let path = format!("/storage/files/{name}");
        let mock = server.mock(|when, then| {
            when.method(GET).path(path.as_str());
            then.status(200).body("not really media");
        });
        let frame = serde_json::json!({
            "type": "files",
            "data": {"name": "alice", "files": [{"name": name, "extension": extension}]},
        });
        bot.handle_text(&frame.to_string(), outbox).await;
        mock
    }

    /// Value following the last occurrence of `flag`.
    fn last_value<'a>(argv: &'a [String], flag: &str) -> Option<&'a str> {
        let index = argv.iter().rposition(|arg| arg == flag)?;
        argv.get(index + 1).map(String::as_str)
    }

    fn chat(name: &str, text: &str) -> ChatMessage {
        ChatMessage {
            name: name.into(),
            text: text.into(),
        }
    }

    fn drain(outbox: &mut mpsc::Receiver<OutboundFrame>) -> Vec<String> {
        let mut texts = Vec::new();
        while let Ok(frame) = outbox.try_recv() {
            texts.push(frame.data);
        }
        texts
    }

    #[tokio::test]
    async fn ping_replies_pong() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bot, _) = bot(config(0, "true", dir.path()));
        let (tx, mut rx) = mpsc::channel(8);

        let ran = bot.handle_chat(&chat("alice", ",ping"), &RoomId::Number(1), &tx).await;

        assert_eq!(ran, Some(CommandKind::Ping));
        let frame = rx.try_recv().unwrap();
        assert_eq!(frame, OutboundFrame::message("Pong!", RoomId::Number(1)));
    }

    #[tokio::test]
    async fn cooldown_blocks_every_command_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bot, uploader) = bot(config(60, "echo /tmp/out.gif", dir.path()));
        let (tx, mut rx) = mpsc::channel(8);
        let before = bot.gate.last_command();

        let words = [
            "ping", "help", "describe x", "wins", "num 5", "date", "who", "when", "bird", "post",
            "meme", "vid",
        ];
        for word in words {
            let ran = bot
                .handle_chat(&chat("alice", &format!(",{word}")), &RoomId::Number(1), &tx)
                .await;
            assert_eq!(ran, None, "{word} should be gated");
        }

        assert!(drain(&mut rx).is_empty());
        assert!(uploader.calls.lock().unwrap().is_empty());
        assert_eq!(bot.gate.last_command(), before);
    }

    #[tokio::test]
    async fn own_messages_and_plain_text_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bot, _) = bot(config(0, "true", dir.path()));
        let (tx, mut rx) = mpsc::channel(8);

        assert_eq!(bot.handle_chat(&chat("gluebot", ",ping"), &RoomId::Number(1), &tx).await, None);
        assert_eq!(bot.handle_chat(&chat("alice", "ping"), &RoomId::Number(1), &tx).await, None);
        assert_eq!(bot.handle_chat(&chat("alice", ",dance"), &RoomId::Number(1), &tx).await, None);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn malformed_command_still_consumes_the_window() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bot, uploader) = bot(config(0, "echo /tmp/out.gif", dir.path()));
        bot.gate = CooldownGate::open(Duration::from_secs(60));
        let (tx, _rx) = mpsc::channel(8);

        let ran = bot.handle_chat(&chat("alice", ",describe"), &RoomId::Number(1), &tx).await;

        assert_eq!(ran, Some(CommandKind::Describe));
        assert!(uploader.calls.lock().unwrap().is_empty());
        assert!(bot.gate.blocked());
    }

    #[tokio::test]
    async fn unknown_command_does_not_touch_the_window() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bot, _) = bot(config(0, "true", dir.path()));
        bot.gate = CooldownGate::open(Duration::from_secs(60));
        let (tx, _rx) = mpsc::channel(8);

        bot.handle_chat(&chat("alice", ",dance"), &RoomId::Number(1), &tx).await;
        assert_eq!(bot.gate.last_command(), None);
    }

    #[tokio::test]
    async fn successful_render_is_uploaded() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bot, uploader) = bot(config(0, "printf \"/tmp/out.gif\\n\"", dir.path()));
        let (tx, _rx) = mpsc::channel(8);

        bot.handle_chat(&chat("alice", ",describe the cat"), &RoomId::Number(4), &tx).await;

        let calls = uploader.calls.lock().unwrap();
        assert_eq!(*calls, vec![(PathBuf::from("/tmp/out.gif"), RoomId::Number(4))]);
    }

    #[tokio::test]
    async fn failed_render_uploads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bot, uploader) = bot(config(0, "echo boom >&2; exit 1", dir.path()));
        let (tx, _rx) = mpsc::channel(8);

        let ran = bot.handle_chat(&chat("alice", ",describe the cat"), &RoomId::Number(4), &tx).await;

        assert_eq!(ran, Some(CommandKind::Describe));
        assert!(uploader.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reversed_number_range_renders_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bot, uploader) = bot(config(0, "echo /tmp/out.gif", dir.path()));
        let (tx, _rx) = mpsc::channel(8);

        let ran = bot.handle_chat(&chat("alice", ",num 9 to 3"), &RoomId::Number(1), &tx).await;
        assert_eq!(ran, Some(CommandKind::Numbers));
        assert!(uploader.calls.lock().unwrap().is_empty());

        bot.handle_chat(&chat("alice", ",num 3 to 9"), &RoomId::Number(1), &tx).await;
        assert_eq!(uploader.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn wins_without_args_needs_a_roster() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bot, uploader) = bot(config(0, "echo /tmp/out.gif", dir.path()));
        let (tx, _rx) = mpsc::channel(8);

        bot.handle_chat(&chat("alice", ",wins"), &RoomId::Number(1), &tx).await;
        assert!(uploader.calls.lock().unwrap().is_empty());

        bot.handle_text(
            r#"{"type": "loadUsers", "data": {"1": [{"name": "alice"}]}}"#,
            &tx,
        )
        .await;
        bot.handle_chat(&chat("alice", ",wins"), &RoomId::Number(1), &tx).await;
        assert_eq!(uploader.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bird_posts_a_line_from_the_word_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/aves.txt"), "\nkakapo\n\n").unwrap();
        let (mut bot, _) = bot(config(0, "true", dir.path()));
        let (tx, mut rx) = mpsc::channel(8);

        bot.handle_chat(&chat("alice", ",birb"), &RoomId::Number(2), &tx).await;

        assert_eq!(drain(&mut rx), vec![".i \"kakapo\" bird".to_string()]);
    }

    #[tokio::test]
    async fn meme_without_attachment_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bot, uploader) = bot(config(0, "echo /tmp/out.gif", dir.path()));
        let (tx, mut rx) = mpsc::channel(8);

        let ran = bot.handle_chat(&chat("alice", ",meme hello"), &RoomId::Number(1), &tx).await;

        assert_eq!(ran, Some(CommandKind::Meme));
        assert!(drain(&mut rx).is_empty());
        assert!(uploader.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn files_frames_update_the_attachment_cache() {
        let dir = tempfile::tempdir().unwrap();
        let (mut bot, _) = bot(config(0, "true", dir.path()));
        let (tx, _rx) = mpsc::channel(8);

        bot.handle_text(
            r#"{"type": "files", "data": {"name": "gluebot", "files": [{"name": "a.gif", "extension": ".gif"}]}}"#,
            &tx,
        )
        .await;
        assert!(bot.attachments.last().is_none());

        bot.handle_text(
            r#"{"type": "files", "data": {"name": "alice", "files": [{"name": "b.png", "extension": ".png"}]}}"#,
            &tx,
        )
        .await;
        assert_eq!(
            bot.attachments.last().map(|attachment| attachment.url.as_str()),
            Some("https://deek.chat/storage/files/b.png")
        );
    }

    #[tokio::test]
    async fn video_caption_overrides_options_and_removes_the_download() {
        let server = MockServer::start();
        let dir = tempfile::tempdir().unwrap();
        let argv_file = dir.path().join("argv.txt");
        let script = format!("printf \"%s\\n\" \"$@\" > {}; exit 1", argv_file.display());
        let (mut bot, uploader) = bot(config_at(&server.base_url(), 0, &script, dir.path()));
        let (tx, mut rx) = mpsc::channel(8);

        let download = seed_attachment(&mut bot, &server, "clip.webm", ".webm", &tx).await;
        let ran = bot.handle_chat(&chat("bob", ",vid hi"), &RoomId::Number(5), &tx).await;

        assert_eq!(ran, Some(CommandKind::Video));
        download.assert();
        assert_eq!(drain(&mut rx), vec!["Generating video...".to_string()]);
        assert!(uploader.calls.lock().unwrap().is_empty());

        let argv: Vec<String> = std::fs::read_to_string(&argv_file)
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        assert_eq!(last_value(&argv, "--width"), Some("600"));
        assert_eq!(last_value(&argv, "--output"), Some("/tmp/gifmaker.webm"));
        assert_eq!(last_value(&argv, "--frames"), Some("18"));
        assert_eq!(last_value(&argv, "--delay"), Some("600"));
        assert_eq!(last_value(&argv, "--words"), Some("hi"));

        let source = PathBuf::from(last_value(&argv, "--input").unwrap());
        assert!(source.to_string_lossy().ends_with(".webm"));
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn meme_caption_renders_the_download_and_uploads() {
        let server = MockServer::start();
        let dir = tempfile::tempdir().unwrap();
        let argv_file = dir.path().join("argv.txt");
        let script = format!(
            "printf \"%s\\n\" \"$@\" > {}; echo /tmp/out.gif",
            argv_file.display()
        );
        let (mut bot, uploader) = bot(config_at(&server.base_url(), 0, &script, dir.path()));
        let (tx, mut rx) = mpsc::channel(8);

        let _download = seed_attachment(&mut bot, &server, "cat.png", ".png", &tx).await;
        bot.handle_chat(&chat("bob", ",meme random"), &RoomId::Number(5), &tx).await;

        assert_eq!(drain(&mut rx), vec!["Generating gif...".to_string()]);
        assert_eq!(
            *uploader.calls.lock().unwrap(),
            vec![(PathBuf::from("/tmp/out.gif"), RoomId::Number(5))]
        );

        let argv: Vec<String> = std::fs::read_to_string(&argv_file)
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        assert_eq!(last_value(&argv, "--words"), Some(RANDOM_CAPTION));
        assert_eq!(last_value(&argv, "--width"), Some("350"));
        assert_eq!(last_value(&argv, "--frames"), Some("3"));
        let source = PathBuf::from(last_value(&argv, "--input").unwrap());
        assert!(!source.exists());
    }

    #[test]
    fn caption_words_expand_random() {
        assert_eq!(caption_words(None), "");
        assert_eq!(caption_words(Some("random")), RANDOM_CAPTION);
        assert_eq!(caption_words(Some("top;text")), "toptext");
    }

    #[test]
    fn death_date_is_within_fifty_years() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let date = random_death_date(&mut rng, today);
            let parsed = NaiveDate::parse_from_str(&date, "%d %b %Y").unwrap();
            assert!(parsed >= today);
            assert!(parsed <= today + Days::new(MAX_DEATH_DAYS));
        }
    }
}
