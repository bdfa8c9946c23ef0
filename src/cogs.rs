//! Cog registry and the help menu built from it.
//!
//! Cog names double as the feature keys guilds toggle in their settings.

use crate::render::{Embed, Render, RenderedMessage};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CogInfo {
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub commands: &'static [CommandInfo],
}

macro_rules! cmd {
    ($name:literal, $usage:literal, $description:literal) => {
        CommandInfo {
            name: $name,
            usage: $usage,
            description: $description,
        }
    };
}

pub static COGS: &[CogInfo] = &[
    CogInfo {
        name: "moderation",
        category: "Moderation",
        description: "Kick, ban, timeout and purge.",
        commands: &[
            cmd!("kick", "/kick <member> [reason]", "Remove a member from the server."),
            cmd!("ban", "/ban <member> [reason]", "Ban a member."),
            cmd!("timeout", "/timeout <member> <minutes>", "Mute a member for a while."),
            cmd!("purge", "/purge <count>", "Bulk delete recent messages."),
        ],
    },
    CogInfo {
        name: "automod",
        category: "Moderation",
        description: "Automatic message filtering and auto-deletion.",
        commands: &[
            cmd!("autodelete", "/autodelete <channel> <seconds>", "Delete messages in a channel after a delay."),
            cmd!("automod", "/automod <on|off>", "Toggle the word filter."),
        ],
    },
    CogInfo {
        name: "reactionroles",
        category: "Moderation",
        description: "Grant roles when members react to a message.",
        commands: &[cmd!("reactionrole", "/reactionrole <message> <emoji> <role>", "Bind an emoji to a role.")],
    },
    CogInfo {
        name: "tictactoe",
        category: "Games",
        description: "Tic-tac-toe against a friend or the bot.",
        commands: &[cmd!("tictactoe", "/tictactoe [opponent]", "Start a game; leave out the opponent to play the bot.")],
    },
    CogInfo {
        name: "memory",
        category: "Games",
        description: "Find all twelve emoji pairs.",
        commands: &[cmd!("memory", "/memory", "Start a memory-match board.")],
    },
    CogInfo {
        name: "password",
        category: "Games",
        description: "Invent a password that survives eighteen increasingly silly rules.",
        commands: &[cmd!("password", "/password", "Start the password game.")],
    },
    CogInfo {
        name: "trivia",
        category: "Games",
        description: "Multiple choice trivia questions.",
        commands: &[cmd!("trivia", "/trivia [category]", "Answer a trivia question.")],
    },
    CogInfo {
        name: "ocr",
        category: "Media",
        description: "Read the text in an image.",
        commands: &[cmd!("ocr", "/ocr <image>", "Extract text from an attachment.")],
    },
    CogInfo {
        name: "plant",
        category: "Media",
        description: "Identify a plant from a photo.",
        commands: &[cmd!("plant", "/plant <image>", "Show the best species matches.")],
    },
    CogInfo {
        name: "meme",
        category: "Media",
        description: "Browse memes from Reddit.",
        commands: &[cmd!("meme", "/meme [subreddit]", "Page through hot posts.")],
    },
    CogInfo {
        name: "steal",
        category: "Media",
        description: "Copy custom emojis into this server.",
        commands: &[cmd!("steal", "/steal <emoji>", "Add an emoji from another server.")],
    },
    CogInfo {
        name: "manga",
        category: "Media",
        description: "Read manga chapters from MangaDex.",
        commands: &[
            cmd!("manga", "/manga <title>", "Search for a series."),
            cmd!("read", "/read <chapter id>", "Page through a chapter."),
        ],
    },
    CogInfo {
        name: "music",
        category: "Music",
        description: "Voice playback and song recognition.",
        commands: &[
            cmd!("play", "/play <query>", "Queue a track."),
            cmd!("skip", "/skip", "Skip the current track."),
            cmd!("shazam", "/shazam <audio>", "Recognize a song."),
        ],
    },
    CogInfo {
        name: "embed",
        category: "Utility",
        description: "Build a custom embed step by step.",
        commands: &[cmd!("embed", "/embed", "Start the embed builder.")],
    },
    CogInfo {
        name: "giveaway",
        category: "Utility",
        description: "Run giveaways with reaction entry.",
        commands: &[cmd!("giveaway", "/giveaway <prize> <minutes>", "Start a giveaway.")],
    },
    CogInfo {
        name: "weather",
        category: "Utility",
        description: "Current weather for a city.",
        commands: &[cmd!("weather", "/weather <city>", "Show the forecast.")],
    },
    CogInfo {
        name: "pokemon",
        category: "Utility",
        description: "Look up a Pokémon.",
        commands: &[cmd!("pokedex", "/pokedex <name>", "Show stats and types.")],
    },
    CogInfo {
        name: "shorten",
        category: "Utility",
        description: "Shorten a link.",
        commands: &[cmd!("shorten", "/shorten <url>", "Create a short link.")],
    },
    CogInfo {
        name: "nsfw",
        category: "NSFW",
        description: "Age-restricted image feeds (NSFW channels only).",
        commands: &[cmd!("nsfw", "/nsfw <category>", "Fetch an image.")],
    },
];

pub fn find(name: &str) -> Option<&'static CogInfo> {
    COGS.iter().find(|cog| cog.name.eq_ignore_ascii_case(name))
}

/// One help page per cog.
#[derive(Debug, Clone, Copy)]
pub struct HelpPage {
    pub cog: &'static CogInfo,
}

impl Render for HelpPage {
    fn render(&self) -> Result<RenderedMessage> {
        let mut embed = Embed::new(format!("{} • {}", self.cog.category, self.cog.name))
            .description(self.cog.description)
            .color(0x5865F2);
        for command in self.cog.commands {
            embed = embed.field(
                format!("`{}`", command.usage),
                command.description,
                false,
            );
        }
        embed.validate()?;
        Ok(RenderedMessage::from_embed(embed))
    }
}

/// Help pages for every cog the predicate keeps, in registry order.
pub fn help_pages(mut enabled: impl FnMut(&CogInfo) -> bool) -> Vec<HelpPage> {
    COGS.iter()
        .filter(|cog| enabled(*cog))
        .map(|cog| HelpPage { cog })
        .collect()
}
