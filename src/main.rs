//! Plinko Drop command-line entry point
//!
//! Runs an outcome search natively and logs a summary of the drop.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;
    use std::process::ExitCode;
    use std::sync::atomic::AtomicBool;

    use clap::Parser;

    use plinko_drop::error::Result;
    use plinko_drop::settings::EngineSettings;
    use plinko_drop::sim::{OutcomeSearch, SearchReport, SearchRequest, SearchResult};

    #[derive(Debug, Parser)]
    #[command(name = "plinko-drop", version)]
    #[command(about = "Find a natural-looking plinko drop that lands in a chosen slot")]
    struct Args {
        /// Slot the ball must land in (omit with --classic)
        #[arg(long, default_value_t = 0, conflicts_with = "classic")]
        target: usize,

        /// Base seed for the search
        #[arg(long, default_value_t = 12345)]
        seed: u64,

        /// Accept the first natural landing instead of forcing a slot
        #[arg(long)]
        classic: bool,

        /// Restrict the drop to this zone (0-based)
        #[arg(long)]
        zone: Option<usize>,

        /// Number of drop zones the board is split into
        #[arg(long, default_value_t = 3)]
        zones: usize,

        /// JSON settings file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the outcome as JSON on stdout
        #[arg(long)]
        json: bool,

        // Board overrides
        #[arg(long)]
        width: Option<f32>,
        #[arg(long)]
        height: Option<f32>,
        #[arg(long)]
        rows: Option<u32>,
        #[arg(long)]
        slots: Option<u32>,
    }

    impl Args {
        fn settings(&self) -> Result<EngineSettings> {
            let mut settings = match &self.config {
                Some(path) => EngineSettings::load(path)?,
                None => EngineSettings::default(),
            };
            let board = &mut settings.board;
            if let Some(width) = self.width {
                board.board_width = width;
            }
            if let Some(height) = self.height {
                board.board_height = height;
            }
            if let Some(rows) = self.rows {
                board.peg_rows = rows;
            }
            if let Some(slots) = self.slots {
                board.slot_count = slots;
            }
            settings.validate()?;
            Ok(settings)
        }

        fn request(&self, engine: &OutcomeSearch) -> Result<SearchRequest> {
            let mut request = if self.classic {
                SearchRequest::classic(self.seed)
            } else {
                SearchRequest::targeted(self.target, self.seed)
            };
            if let Some(index) = self.zone {
                let zone = engine
                    .board()
                    .drop_zones(self.zones)
                    .get(index)
                    .copied()
                    .ok_or(plinko_drop::sim::SearchError::InvalidDropZone { index })?;
                request = request.in_zone(zone);
            }
            Ok(request)
        }
    }

    fn summarize(report: &SearchReport) {
        log::info!(
            "Attempts: {} (stuck {}, never reached bucket {}, wrong slot {})",
            report.attempts,
            report.stuck,
            report.never_reached,
            report.wrong_slot
        );
    }

    fn run(args: &Args) -> Result<bool> {
        let settings = args.settings()?;
        let engine = OutcomeSearch::new(&settings)?;
        let request = args.request(&engine)?;
        let report = engine.run(&request, &AtomicBool::new(false))?;
        summarize(&report);

        match &report.result {
            SearchResult::Found(outcome) => {
                let hits = outcome.trajectory.peg_hits().count();
                log::info!(
                    "Landed in slot {} after {} frames ({} peg hits, start x={:.1}, randomness={:.2})",
                    outcome.landed_slot,
                    outcome.frame_count(),
                    hits,
                    outcome.params.start_x,
                    outcome.params.bounce_randomness
                );
                if args.json {
                    println!("{}", outcome.to_json()?);
                }
                Ok(true)
            }
            SearchResult::Exhausted => {
                log::error!("No drop found for {:?} within the attempt budget", request.mode);
                Ok(false)
            }
            SearchResult::Cancelled => Ok(false),
        }
    }

    pub fn main() -> ExitCode {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        let args = Args::parse();
        log::info!("Plinko Drop (native) starting...");

        match run(&args) {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::from(2),
            Err(e) => {
                log::error!("{}", e);
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    cli::main()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser entry point is `platform::web::start`
}
