use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use database::{retry_with_backoff, Database, RetryPolicy};
use league::{League, LeagueError, MatchFilter, Settings};
use serde::Serialize;
use types::{GameId, GameType, MatchId, MatchStatus, Player, SystemClock};

#[derive(Parser, Debug)]
#[command(name = "corner-pocket", about = "Track pool matches between league players")]
struct Cli {
    /// SQLite database file or URL. Falls back to DATABASE_URL, then the config file.
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// YAML settings file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Act as this player (handle).
    #[arg(long = "as", global = true)]
    acting_as: Option<String>,

    /// Act as the owner of this access token instead.
    #[arg(long, env = "CORNER_POCKET_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        handle: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    CreateMatch {
        /// Opponent's handle.
        opponent: String,
        #[arg(short, long, default_value = "8-ball")]
        game_type: GameType,
        #[arg(short, long, default_value_t = 5)]
        race_to: i64,
    },
    AddGame {
        match_id: i64,
        #[arg(long)]
        winner: String,
        #[arg(long)]
        loser: String,
        /// Defaults to the match's game type.
        #[arg(short, long)]
        game_type: Option<GameType>,
    },
    EditGame {
        match_id: i64,
        game_id: i64,
        #[arg(long)]
        winner: String,
        #[arg(long)]
        loser: String,
    },
    DeleteGame {
        match_id: i64,
        game_id: i64,
    },
    Submit {
        match_id: i64,
    },
    Approve {
        match_id: i64,
        #[arg(short, long, default_value = "")]
        note: String,
    },
    Decline {
        match_id: i64,
        #[arg(short, long, default_value = "")]
        note: String,
    },
    Cancel {
        match_id: i64,
    },
    DeleteMatch {
        match_id: i64,
    },
    Show {
        match_id: i64,
    },
    List {
        /// Only matches the acting player is part of.
        #[arg(long)]
        mine: bool,
        #[arg(short, long)]
        game_type: Option<GameType>,
        #[arg(short, long)]
        status: Option<MatchStatus>,
    },
    Stats {
        /// Defaults to the acting player.
        handle: Option<String>,
        #[arg(short, long)]
        game_type: Option<GameType>,
    },
    Leaderboard {
        #[arg(short, long, default_value = "8-ball")]
        game_type: GameType,
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("args: {cli:?}");

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load(cli.config.as_deref())?;
    let config = settings.database_config(cli.database.clone());
    let db = retry_with_backoff(RetryPolicy::default(), || Database::connect(&config)).await?;
    let league = League::from_settings(db, &settings, Arc::new(SystemClock));
    let session = Session {
        league: &league,
        acting_as: cli.acting_as,
        token: cli.token,
    };

    match cli.command {
        Command::Register {
            email,
            handle,
            name,
            password,
        } => print(&league.identity.register(&email, &handle, &name, &password).await?),
        Command::Login { email, password } => {
            print(&league.identity.login(&email, &password).await?)
        }
        Command::CreateMatch {
            opponent,
            game_type,
            race_to,
        } => {
            let me = session.acting().await?;
            let opponent = league.identity.get_by_handle(&opponent).await?;
            print(&league.matches.create(me.id, opponent.id, game_type, race_to).await?)
        }
        Command::AddGame {
            match_id,
            winner,
            loser,
            game_type,
        } => {
            let me = session.acting().await?;
            let match_id = MatchId::new(match_id);
            let winner = league.identity.get_by_handle(&winner).await?;
            let loser = league.identity.get_by_handle(&loser).await?;
            let game_type = match game_type {
                Some(t) => t,
                None => league.matches.get_visible(me.id, match_id).await?.match_.game_type,
            };
            print(
                &league
                    .matches
                    .add_game(me.id, match_id, winner.id, loser.id, game_type)
                    .await?,
            )
        }
        Command::EditGame {
            match_id,
            game_id,
            winner,
            loser,
        } => {
            let me = session.acting().await?;
            let winner = league.identity.get_by_handle(&winner).await?;
            let loser = league.identity.get_by_handle(&loser).await?;
            let (match_id, game_id) = (MatchId::new(match_id), GameId::new(game_id));
            print(
                &league
                    .matches
                    .edit_game(me.id, match_id, game_id, winner.id, loser.id)
                    .await?,
            )
        }
        Command::DeleteGame { match_id, game_id } => {
            let me = session.acting().await?;
            print(
                &league
                    .matches
                    .delete_game(me.id, MatchId::new(match_id), GameId::new(game_id))
                    .await?,
            )
        }
        Command::Submit { match_id } => {
            let me = session.acting().await?;
            print(&league.matches.submit(me.id, MatchId::new(match_id)).await?)
        }
        Command::Approve { match_id, note } => {
            let me = session.acting().await?;
            print(&league.matches.approve(me.id, MatchId::new(match_id), &note).await?)
        }
        Command::Decline { match_id, note } => {
            let me = session.acting().await?;
            print(&league.matches.decline(me.id, MatchId::new(match_id), &note).await?)
        }
        Command::Cancel { match_id } => {
            let me = session.acting().await?;
            print(&league.matches.cancel(me.id, MatchId::new(match_id)).await?)
        }
        Command::DeleteMatch { match_id } => {
            let me = session.acting().await?;
            league.matches.delete(me.id, MatchId::new(match_id)).await?;
            Ok(())
        }
        Command::Show { match_id } => {
            let me = session.acting().await?;
            print(&league.matches.get_visible(me.id, MatchId::new(match_id)).await?)
        }
        Command::List {
            mine,
            game_type,
            status,
        } => {
            let mut filter = MatchFilter::new();
            if mine {
                filter = filter.participant(session.acting().await?.id);
            }
            if let Some(game_type) = game_type {
                filter = filter.game_type(game_type);
            }
            if let Some(status) = status {
                filter = filter.status(status);
            }
            print(&league.matches.list(filter).await?)
        }
        Command::Stats { handle, game_type } => {
            let player = match handle {
                Some(handle) => league.identity.get_by_handle(&handle).await?,
                None => session.acting().await?,
            };
            print(&league.stats.summary(player.id, game_type).await?)
        }
        Command::Leaderboard { game_type, limit } => {
            print(&league.stats.leaderboard(game_type, limit).await?)
        }
    }
}

struct Session<'a> {
    league: &'a League,
    acting_as: Option<String>,
    token: Option<String>,
}

impl Session<'_> {
    async fn acting(&self) -> Result<Player, LeagueError> {
        match (&self.token, &self.acting_as) {
            (Some(token), _) => self.league.identity.resolve(token).await,
            (None, Some(handle)) => self.league.identity.get_by_handle(handle).await,
            (None, None) => Err(LeagueError::InvalidArgument(
                "pass --as <handle> or --token to say who is acting".to_string(),
            )),
        }
    }
}

fn print<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
