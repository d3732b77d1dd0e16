use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use bigtwo::prelude::*;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "console-client", version, about = "Play Big Two from a terminal")]
struct Cli {
    /// Server to join: host:port for TCP, or a ws:// URL
    #[arg(short, long, default_value = DEFAULT_SERVER)]
    server: String,

    /// Display name shown to the other players
    #[arg(short, long)]
    name: String,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(long, default_value_t = false)]
    debug: bool,
}

// ---------------------------------------------------------------------------
// Rules: free play
// ---------------------------------------------------------------------------

/// Three of diamonds, which opens the round.
const OPENING_CARD: Card = Card { suit: 0, rank: 2 };

/// Deals the deck round-robin and accepts any selection of cards from the
/// player whose turn it is. Hand ranking is left to the players.
struct FreePlay;

impl FreePlay {
    fn next_after(state: &GameState, seat: Seat) -> Option<Seat> {
        let mut next = seat.next();
        while next != seat {
            if !state.player(next).is_vacant() {
                return Some(next);
            }
            next = next.next();
        }
        None
    }
}

impl GameEngine for FreePlay {
    fn apply_start(&self, state: &mut GameState, deck: &Deck) {
        for (i, card) in deck.cards().iter().enumerate() {
            if let Some(seat) = Seat::new(i % NUM_PLAYERS) {
                state.player_mut(seat).hand.push(*card);
            }
        }
    }

    fn apply_move(&self, state: &mut GameState, seat: Seat, cards: &[usize]) -> MoveOutcome {
        if cards.is_empty() {
            if state.table().is_empty() {
                return MoveOutcome::rejected("cannot pass on an empty table");
            }
        } else {
            let hand = &state.player(seat).hand;
            if let Some(&bad) = cards.iter().find(|&&i| i >= hand.len()) {
                return MoveOutcome::rejected(format!("no card {bad}"));
            }
            let mut sorted = cards.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            if sorted.len() != cards.len() {
                return MoveOutcome::rejected("a card was picked twice");
            }
        }

        let mut played = Vec::with_capacity(cards.len());
        let hand = &mut state.player_mut(seat).hand;
        let mut indices = cards.to_vec();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        for i in indices {
            played.push(hand.remove(i));
        }
        played.reverse();
        state.push_hand(Hand {
            seat,
            cards: played,
        });

        let next = Self::next_after(state, seat);
        if let Err(e) = state.set_active_player(next) {
            tracing::warn!(error = %e, "could not pass the turn on");
        }
        MoveOutcome::Accepted
    }

    fn current_player(&self, state: &GameState) -> Option<Seat> {
        state.active_player().or_else(|| {
            state
                .occupied_seats()
                .find(|&s| state.player(s).hand.contains(&OPENING_CARD))
                .or_else(|| state.occupied_seats().next())
        })
    }

    fn is_game_over(&self, state: &GameState) -> bool {
        !state.table().is_empty()
            && state
                .occupied_seats()
                .any(|seat| state.player(seat).hand.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Presenter: stdout
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Console {
    view: OnceLock<GameStateView>,
    input: AtomicBool,
}

impl Console {
    fn attach(&self, view: GameStateView) {
        let _ = self.view.set(view);
    }

    fn can_act(&self) -> bool {
        self.input.load(Ordering::Relaxed)
    }
}

impl Presenter for Console {
    fn refresh(&self) {
        let Some(view) = self.view.get() else {
            return;
        };
        view.read(|state| {
            for seat in Seat::all() {
                let player = state.player(seat);
                if player.is_vacant() {
                    continue;
                }
                let marker = if state.active_player() == Some(seat) { '*' } else { ' ' };
                let cards = player.hand.len();
                println!("{marker} {seat}: {:<12} {cards} cards", player.name);
            }
            if let Some(last) = state.last_hand() {
                println!("  table: {} by {}", render(&last.cards), last.seat);
            }
        });
    }

    fn show_message(&self, text: &str) {
        println!("{text}");
    }

    fn show_chat_line(&self, text: &str) {
        println!("[chat] {text}");
    }

    fn enable_input(&self, enabled: bool) {
        self.input.store(enabled, Ordering::Relaxed);
        if enabled {
            println!("Your move: play <i> [<j> ...] | pass");
        }
    }
}

fn render(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "pass".to_string();
    }
    cards
        .iter()
        .map(Card::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Play(Vec<usize>),
    Pass,
    Hand,
    Quit,
    Chat(String),
}

fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    let mut words = line.split_whitespace();
    let cmd = match words.next() {
        None => return Ok(None),
        Some("play") => {
            let indices = words
                .map(|w| {
                    w.parse::<usize>()
                        .map_err(|_| format!("not a card index: {w}"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if indices.is_empty() {
                return Err("play needs at least one card index".into());
            }
            Command::Play(indices)
        }
        Some("pass") => Command::Pass,
        Some("hand") => Command::Hand,
        Some("quit") => Command::Quit,
        Some(_) => Command::Chat(line.to_string()),
    };
    Ok(Some(cmd))
}

fn print_hand(client: &BigTwoClient<FreePlay, Console>) {
    let Some(seat) = client.player_id() else {
        println!("No seat yet");
        return;
    };
    client.state().read(|state| {
        for (i, card) in state.player(seat).hand.iter().enumerate() {
            print!("{i}:{card} ");
        }
        println!();
    });
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let fallback = if cli.debug { "debug" } else { "bigtwo=info,warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let console = Arc::new(Console::default());
    let mut client = BigTwoClient::builder()
        .build(FreePlay, Arc::clone(&console));
    console.attach(client.state());

    client.connect(&cli.server, &cli.name).await?;
    println!("Connected to {} as {}", cli.server, cli.name);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let closed = client.closed();
    tokio::pin!(closed);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            () = &mut closed => break,
        };
        let Some(line) = line else {
            break;
        };

        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let result = match command {
            Command::Play(cards) if console.can_act() => {
                client.make_move(&cards).await
            }
            Command::Pass if console.can_act() => client.pass().await,
            Command::Play(_) | Command::Pass => {
                println!("Not your turn");
                Ok(())
            }
            Command::Hand => {
                print_hand(&client);
                Ok(())
            }
            Command::Chat(text) => client.send_chat(&text).await,
            Command::Quit => break,
        };
        match result {
            Ok(()) => {}
            Err(ClientError::NotConnected) if !client.is_connected() => break,
            Err(e) => println!("{e}"),
        }
    }

    if client.is_connected() {
        client.disconnect().await?;
    }
    Ok(())
}
