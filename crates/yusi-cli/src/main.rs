//! Line-oriented CLI for Yusi scenario rooms.
//!
//! Create or join a room, then `watch` it: the watch loop polls the
//! server every two seconds (or consumes the push channel with
//! `--push`), prints room activity as it happens, and renders the
//! situation report once it is ready.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use yusi_client::controller::{RoomController, RoomFeedEvent};
use yusi_client::http::HttpRoomApi;
use yusi_client::push::spawn_sse_watch;
use yusi_client::report::render_report;
use yusi_core::view::{RoomPhase, RoomView};

#[derive(Parser)]
#[command(name = "yusi")]
#[command(about = "Yusi scenario-room client", long_about = None)]
struct Cli {
    /// Server base URL
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Bearer token for authenticated routes
    #[arg(long, global = true)]
    token: Option<String>,

    /// Acting user id
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a room and print its shareable code
    Create {
        /// Room capacity, between 2 and 8
        #[arg(long, default_value_t = 4)]
        max_members: usize,
    },
    /// Join an existing room by code
    Join { code: String },
    /// Follow a room until it finishes, then print the report
    Watch {
        code: String,
        /// Use the server push channel instead of polling
        #[arg(long)]
        push: bool,
    },
    /// List the approved scenario catalog
    Scenarios,
    /// List your past rooms
    History,
}

impl Cli {
    fn api(&self) -> HttpRoomApi {
        let api = HttpRoomApi::new(&self.server);
        match &self.token {
            Some(token) => api.with_bearer(token),
            None => api,
        }
    }

    fn user(&self) -> Result<&str, Box<dyn std::error::Error>> {
        self.user
            .as_deref()
            .ok_or_else(|| "this command needs --user".into())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    use yusi_client::api::RoomApi;

    match &cli.command {
        Command::Create { max_members } => {
            let mut ctrl = RoomController::new(cli.api(), cli.user()?);
            ctrl.create_room(*max_members).await?;
            let code = ctrl.room_code().unwrap_or_default().to_string();
            println!("Room {code} created (capacity {max_members}).");
            println!("Share the code, then run: yusi watch {code} --user {}", ctrl.user_id());
        }
        Command::Join { code } => {
            let mut ctrl = RoomController::new(cli.api(), cli.user()?);
            ctrl.join_room(code).await?;
            if let Some(view) = ctrl.view() {
                print_view(&view);
            }
            println!("Joined. Run: yusi watch {code} --user {}", ctrl.user_id());
        }
        Command::Watch { code, push } => {
            let api = cli.api();
            let mut ctrl = RoomController::new(api.clone(), cli.user()?);
            ctrl.attach(code).await?;
            if let Some(view) = ctrl.view() {
                print_view(&view);
            }
            watch(&mut ctrl, &api, code, *push).await;
            print_outcome(&ctrl);
        }
        Command::Scenarios => {
            for scenario in cli.api().get_scenarios().await? {
                println!("{}  {}", scenario.id, scenario.title);
                println!("    {}", scenario.description);
            }
        }
        Command::History => {
            for room in cli.api().get_history().await? {
                println!(
                    "{}  {}  {} member(s)",
                    room.code,
                    phase_of(&room),
                    room.members.len()
                );
            }
        }
    }
    Ok(())
}

async fn watch(ctrl: &mut RoomController<HttpRoomApi>, api: &HttpRoomApi, code: &str, push: bool) {
    let mut last_phase: Option<RoomPhase> = None;
    let mut on_update = move |ctrl: &mut RoomController<HttpRoomApi>| {
        for event in ctrl.drain_events() {
            println!("{}", describe(&event));
        }
        if let Some(view) = ctrl.view()
            && last_phase != Some(view.phase)
        {
            last_phase = Some(view.phase);
            println!("[{}]", view.phase.label());
        }
    };

    if push {
        let mut rx = spawn_sse_watch(
            api.http_client().clone(),
            api.base_url(),
            api.bearer().map(str::to_string),
            code,
        );
        if ctrl.run_push_loop(&mut rx, &mut on_update).await {
            return;
        }
        println!("Push channel closed; falling back to polling.");
    }
    ctrl.run_poll_loop(on_update).await;
}

fn describe(event: &RoomFeedEvent) -> String {
    match event {
        RoomFeedEvent::MemberJoined { name } => format!("{name} joined the room"),
        RoomFeedEvent::ScenarioChosen { title } => format!("Scenario chosen: {title}"),
        RoomFeedEvent::SubmissionReceived { submitted, members } => {
            format!("Narratives in: {submitted}/{members}")
        }
        RoomFeedEvent::CancelVoteCast { votes, threshold } => {
            format!("Cancel votes: {votes}/{threshold}")
        }
        RoomFeedEvent::StatusChanged { status } => format!("Room is now {status:?}"),
        RoomFeedEvent::ReportReady => "Situation report is ready".to_string(),
        RoomFeedEvent::PollFailed { detail } => format!("(update failed, retrying: {detail})"),
        RoomFeedEvent::ServerInconsistency { detail } => {
            format!("(ignored inconsistent update: {detail})")
        }
    }
}

fn print_view(view: &RoomView) {
    println!(
        "[{}] {} member(s), {} submitted",
        view.phase.label(),
        view.member_count,
        view.members_submitted
    );
}

fn print_outcome(ctrl: &RoomController<HttpRoomApi>) {
    let Some(room) = ctrl.room() else {
        return;
    };
    match ctrl.report() {
        Some(report) => match render_report(report, room) {
            Ok(lines) => {
                for line in lines {
                    println!("{line}");
                }
            }
            Err(e) => eprintln!("Report withheld: {e}"),
        },
        None => println!("Room ended without a report."),
    }
}

fn phase_of(room: &yusi_core::model::Room) -> &'static str {
    use yusi_core::model::RoomStatus;
    match room.status {
        RoomStatus::Waiting => "waiting",
        RoomStatus::InProgress => "in progress",
        RoomStatus::Completed => "completed",
        RoomStatus::Cancelled => "cancelled",
    }
}
