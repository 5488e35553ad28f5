use anyhow::{Context, Result};
use chousei_libs::config::Settings;
use chousei_libs::event::{answer_all, generate_date_range, parse_deadline, Answers, Event, EventDetails};
use chousei_libs::format::{format_date, format_deadline, TeacherPresence};
use chousei_libs::participant::{Grade, Role};
use chousei_libs::select::Analysis;
use chousei_libs::slot;
use chousei_libs::store::{FileBlobStore, Store};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chousei")]
#[command(about = "Find meeting slots that teachers and students can attend")]
struct Cli {
    /// Settings file (TOML). `CHOUSEI_*` variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a member and print their id
    Register {
        name: String,
        #[arg(short, long)]
        role: Role,
        /// Required for students (B3, B4, M1, M2, D1, D2, D3)
        #[arg(short, long)]
        grade: Option<Grade>,
    },
    /// Change a member's name, role or grade
    Profile {
        user: String,
        name: String,
        #[arg(short, long)]
        role: Role,
        #[arg(short, long)]
        grade: Option<Grade>,
    },
    /// List members by role and grade
    Members,
    Create {
        /// Id of the member creating the event
        #[arg(long)]
        creator: String,
        #[command(flatten)]
        details: DetailArgs,
    },
    Edit {
        event: String,
        #[command(flatten)]
        details: DetailArgs,
    },
    Delete {
        event: String,
    },
    /// Submit availability, replacing any earlier answer
    Respond {
        event: String,
        #[arg(short, long)]
        user: String,
        /// Slot key such as 2024-01-15_09:00; repeatable
        #[arg(short, long = "slot")]
        slots: Vec<String>,
        /// Mark every slot of the event
        #[arg(long, conflicts_with = "slots")]
        all: bool,
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Show the turnout grid and recommended slots
    Show {
        event: String,
    },
    List,
}

#[derive(Args)]
struct DetailArgs {
    name: String,
    /// Target grade; repeatable
    #[arg(short, long = "grade", required = true)]
    grades: Vec<Grade>,
    /// Candidate date (YYYY-MM-DD); repeatable
    #[arg(short, long = "date")]
    dates: Vec<NaiveDate>,
    /// First day of a candidate range
    #[arg(long, requires = "to")]
    from: Option<NaiveDate>,
    /// Last day of a candidate range
    #[arg(long, requires = "from")]
    to: Option<NaiveDate>,
    /// Answer deadline (YYYY-MM-DDTHH:MM)
    #[arg(long)]
    deadline: Option<String>,
}

impl DetailArgs {
    fn into_details(self) -> Result<EventDetails> {
        let mut candidate_dates = self.dates;
        if let (Some(from), Some(to)) = (self.from, self.to) {
            candidate_dates.extend(generate_date_range(from, to)?);
        }

        let deadline = self
            .deadline
            .as_deref()
            .map(parse_deadline)
            .transpose()
            .context("deadline must look like 2024-06-01T18:00")?;

        Ok(EventDetails {
            name: self.name,
            target_grades: self.grades.into_iter().collect(),
            candidate_dates,
            deadline,
        })
    }
}

fn setup_logger(level: log::LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    setup_logger(settings.logging.level_filter()?)?;

    let backend = FileBlobStore::new(&settings.storage.data_dir);
    let mut store = Store::open(backend)
        .with_context(|| format!("reading {}", settings.storage.data_dir.display()))?
        .with_time_slots(settings.slots.grid())
        .with_policy(settings.attendance);

    match cli.command {
        Commands::Register { name, role, grade } => {
            let user = store.register(&name, role, grade)?;
            println!("{}", user.id);
        }
        Commands::Profile {
            user,
            name,
            role,
            grade,
        } => {
            store.edit_profile(&user, &name, role, grade)?;
        }
        Commands::Members => print_members(&store),
        Commands::Create { creator, details } => {
            let event = store.create_event(details.into_details()?, &creator)?;
            println!("{}", event.id);
        }
        Commands::Edit { event, details } => {
            store.update_event(&event, details.into_details()?)?;
        }
        Commands::Delete { event } => store.delete_event(&event)?,
        Commands::Respond {
            event,
            user,
            slots,
            all,
            comment,
        } => {
            let target = store
                .event(&event)
                .with_context(|| format!("no event with id {}", event))?;

            let answers: Answers = if all {
                answer_all(target, true)
            } else {
                for key in &slots {
                    slot::decode(key)?;
                }
                slots.into_iter().map(|key| (key, true)).collect()
            };
            store.submit_response(&event, &user, answers, &comment)?;
        }
        Commands::Show { event } => {
            let analysis = store
                .analyze(&event)
                .with_context(|| format!("no event with id {}", event))?;
            if let Some(event) = store.event(&event) {
                print_event(event, &analysis);
            }
        }
        Commands::List => {
            for event in store.events() {
                let deadline = format_deadline(event.deadline)
                    .map(|info| {
                        if info.is_past {
                            format!(" (closed {})", info.text)
                        } else {
                            format!(" (until {})", info.text)
                        }
                    })
                    .unwrap_or_default();
                println!(
                    "{}  {}  {} responses{}",
                    event.id,
                    event.name,
                    event.response_count(),
                    deadline
                );
            }
        }
    }

    Ok(())
}

fn print_members<P: chousei_libs::store::Persistence>(store: &Store<P>) {
    let roster = store.roster();

    println!("Teachers");
    for user in &roster.teachers {
        println!("  {}  {}", user.id, user.name);
    }
    for (grade, students) in &roster.students {
        println!("{}", grade);
        for user in students {
            println!("  {}  {}", user.id, user.name);
        }
    }
}

fn print_event(event: &Event, analysis: &Analysis) {
    let aggregation = &analysis.aggregation;
    let grades: Vec<String> = event.target_grades.iter().map(Grade::to_string).collect();

    println!("{} [{}]", event.name, grades.join(", "));
    println!(
        "{} teachers, {} students answered",
        aggregation.teacher_count, aggregation.student_count
    );

    for tally in &aggregation.all_results {
        println!(
            "{} {}  {}/{} students{}  {}",
            format_date(tally.date),
            tally.slot,
            tally.available_students,
            tally.total_target_students,
            if tally.meets_criteria { " ✓" } else { "" },
            TeacherPresence::from_count(tally.available_teachers).badge()
        );
    }

    match (
        &analysis.recommendation.most_participants,
        &analysis.recommendation.earliest,
    ) {
        (Some(best), Some(first)) => {
            println!(
                "Most participants: {} {} ({})",
                format_date(best.date),
                best.slot,
                best.total_available
            );
            println!("Earliest: {} {}", format_date(first.date), first.slot);
        }
        _ => println!("No slot has enough students yet"),
    }
}
