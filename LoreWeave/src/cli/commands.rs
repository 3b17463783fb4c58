//! Subcommand definitions and execution

use std::path::PathBuf;

use clap::{Args, Subcommand};
use loredata::FileStore;

use crate::model::{DialogueNode, Session};
use crate::render::{self, Gender, TextRenderer};
use crate::Codex;

/// Options shared by every subcommand that opens a store.
#[derive(Args)]
pub struct StoreArgs {
    /// Record store root directory
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Reader gender for variant text (m/f)
    #[arg(short, long)]
    gender: Option<String>,

    /// Reader nickname substituted into text
    #[arg(short, long)]
    nickname: Option<String>,

    /// Emit JSON instead of formatted text
    #[arg(short, long)]
    json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List all chapters with their quests
    Chapters {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Show one quest, optionally expanding its step dialogue
    Quest {
        /// Quest id
        id: i64,

        /// Expand pending talks into dialogue for every step
        #[arg(short, long)]
        expand: bool,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Show one message session as an ordered stage graph
    Session {
        /// Session id
        id: i64,

        #[command(flatten)]
        store: StoreArgs,
    },
}

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the store cannot be opened or read.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Chapters { store } => chapters(store),
            Commands::Quest { id, expand, store } => quest(store, *id, *expand),
            Commands::Session { id, store } => session(store, *id),
        }
    }
}

fn open_codex(args: &StoreArgs) -> anyhow::Result<Codex<FileStore>> {
    let store = FileStore::open(&args.root)?;
    let gender = match &args.gender {
        Some(value) => parse_gender(value)?,
        None => Gender::default(),
    };
    let nickname = args
        .nickname
        .clone()
        .unwrap_or_else(|| render::DEFAULT_NICKNAME.to_string());
    let renderer = TextRenderer::new(gender, nickname);
    Ok(Codex::with_renderer(store, renderer))
}

fn parse_gender(value: &str) -> anyhow::Result<Gender> {
    match value.to_ascii_lowercase().as_str() {
        "m" | "male" => Ok(Gender::Male),
        "f" | "female" => Ok(Gender::Female),
        other => anyhow::bail!("unrecognized gender '{other}' (expected m or f)"),
    }
}

fn chapters(args: &StoreArgs) -> anyhow::Result<()> {
    let mut codex = open_codex(args)?;
    let chapters = codex.chapters()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(chapters)?);
        return Ok(());
    }

    for chapter in chapters {
        let marker = if chapter.synthetic { " (grouped)" } else { "" };
        println!("[{}] {}{marker}", chapter.id, chapter.title);
        for quest in &chapter.quests {
            println!("    {} - {} ({} steps)", quest.id, quest.title, quest.steps.len());
        }
    }
    Ok(())
}

fn quest(args: &StoreArgs, id: i64, expand: bool) -> anyhow::Result<()> {
    let mut codex = open_codex(args)?;

    if expand {
        let step_ids: Vec<i64> = codex
            .quest(id)?
            .map(|quest| quest.steps.iter().map(|step| step.id).collect())
            .unwrap_or_default();
        for step_id in step_ids {
            codex.expand_step(id, step_id)?;
        }
    }

    let Some(quest) = codex.quest(id)? else {
        println!("quest {id} not found");
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(quest)?);
        return Ok(());
    }

    println!("{} - {}", quest.id, quest.title);
    if let Some(title) = &quest.chapter_title {
        println!("chapter: {title}");
    }
    if !quest.description.is_empty() {
        println!("{}", quest.description);
    }
    for step in &quest.steps {
        println!("  step {}: {}", step.id, step.title.as_deref().unwrap_or(""));
        if let Some(description) = &step.description {
            println!("    {description}");
        }
        print_nodes(&step.nodes, 2);
    }
    Ok(())
}

fn print_nodes(nodes: &[DialogueNode], depth: usize) {
    let pad = "    ".repeat(depth);
    for node in nodes {
        if node.speaker.is_empty() {
            println!("{pad}{}", node.text);
        } else {
            println!("{pad}{}: {}", node.speaker, node.text);
        }
        print_nodes(&node.options, depth + 1);
    }
}

fn session(args: &StoreArgs, id: i64) -> anyhow::Result<()> {
    let mut codex = open_codex(args)?;
    let Some(session) = codex.session(id)? else {
        println!("session {id} not found");
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(session)?);
        return Ok(());
    }

    print_session(session);
    Ok(())
}

fn print_session(session: &Session) {
    println!("session {} with {}", session.id, session.npc_name);
    for stage in session.stages.values() {
        println!("  [{}]", stage.seq);
        for message in &stage.messages {
            let who = if message.from_npc {
                session.npc_name.as_str()
            } else {
                "you"
            };
            println!("    {who}: {}", message.text);
        }
        if let Some(options) = &stage.options {
            for choice in &options.choices {
                println!("    > {} (-> {})", choice.text, choice.goto);
            }
        }
        if let Some(next) = stage.next_seq {
            println!("    -> {next}");
        }
        if stage.terminal {
            println!("    (end)");
        }
    }
}
