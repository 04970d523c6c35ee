use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use uni_timetabler::parser::{load_input_from_dir, validate_input};
use uni_timetabler::reporter::{generate_reports, print_summary, OutputFormat};
use uni_timetabler::runner::{
    run_electives, run_main, run_teacher_assignment, MainRunOptions, RunStatus, RunSummary,
};
use uni_timetabler::store::ScheduleStore;
use uni_timetabler::validator::validate_schedule;

#[derive(Parser)]
#[command(name = "uni-timetabler")]
#[command(about = "Constraint-based university timetable generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all three passes on bundled sample data
    Demo,

    /// Run the main scheduling pass
    Schedule {
        /// Directory containing input JSON files
        #[arg(short, long)]
        data: PathBuf,

        /// Path of the schedule store file
        #[arg(short, long, default_value = "./timetable-store.json")]
        store: PathBuf,

        /// Semesters to schedule (default: all with a roadmap)
        #[arg(long, value_delimiter = ',')]
        semesters: Option<Vec<u32>>,

        /// Students per section
        #[arg(long, default_value_t = 50)]
        section_size: u32,

        /// Program code used in section names
        #[arg(long, default_value = "A")]
        program_code: String,

        /// Enable cohort-course routing
        #[arg(long)]
        cohort: bool,

        /// Keep existing placements instead of replacing them
        #[arg(long)]
        keep_existing: bool,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Place electives into the residual capacity
    Electives {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long, default_value = "./timetable-store.json")]
        store: PathBuf,

        /// Theory meetings per elective section
        #[arg(long, default_value_t = 2)]
        theory_needed: u32,

        /// Lab blocks per elective section
        #[arg(long, default_value_t = 1)]
        lab_needed: u32,

        /// Keep existing elective placements
        #[arg(long)]
        keep_existing: bool,
    },

    /// Assign teachers to placed slots by preference specificity
    Teachers {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long, default_value = "./timetable-store.json")]
        store: PathBuf,

        /// Clear existing teacher assignments first
        #[arg(long)]
        clear: bool,
    },

    /// Validate the stored schedule against every invariant
    Validate {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long, default_value = "./timetable-store.json")]
        store: PathBuf,

        /// Show per-violation details
        #[arg(short, long)]
        verbose: bool,
    },

    /// Render reports from the stored schedule
    Report {
        #[arg(short, long)]
        data: PathBuf,

        #[arg(short, long, default_value = "./timetable-store.json")]
        store: PathBuf,

        /// Output directory for report files
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Output format(s): json, markdown, text, or all
        #[arg(short, long, default_value = "all")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo => run_demo(),
        Commands::Schedule {
            data,
            store,
            semesters,
            section_size,
            program_code,
            cohort,
            keep_existing,
            quiet,
        } => cmd_schedule(
            &data,
            &store,
            MainRunOptions {
                selected_semesters: semesters,
                section_size,
                program_code,
                enable_cohort: cohort,
                clear_existing: !keep_existing,
                quiet,
            },
        ),
        Commands::Electives {
            data,
            store,
            theory_needed,
            lab_needed,
            keep_existing,
        } => cmd_electives(&data, &store, theory_needed, lab_needed, !keep_existing),
        Commands::Teachers { data, store, clear } => cmd_teachers(&data, &store, clear),
        Commands::Validate {
            data,
            store,
            verbose,
        } => cmd_validate(&data, &store, verbose),
        Commands::Report {
            data,
            store,
            output,
            format,
        } => cmd_report(&data, &store, &output, &format),
    }
}

fn print_run_summary(label: &str, summary: &RunSummary) {
    match summary.status {
        RunStatus::Ok => println!(
            "{}",
            format!(
                "✓ {}: created {} placements (hash {})",
                label,
                summary.created,
                &summary.hash[..12]
            )
            .green()
        ),
        RunStatus::NoChange => println!(
            "{}",
            format!("= {}: inputs unchanged, nothing to do", label).cyan()
        ),
        RunStatus::Infeasible => println!(
            "{}",
            format!("✗ {}: no feasible schedule found", label).red().bold()
        ),
    }
}

fn cmd_schedule(data: &PathBuf, store_path: &PathBuf, opts: MainRunOptions) -> Result<()> {
    let input = load_input_from_dir(data).context("Failed to load input data")?;
    let validation = validate_input(&input)?;
    for warning in &validation.warnings {
        println!("{} {}", "Warning:".yellow(), warning);
    }

    let mut store = ScheduleStore::open(store_path)?;
    let summary = run_main(&input, &mut store, &opts)?;
    print_run_summary("main schedule", &summary);

    if summary.status == RunStatus::Ok && !opts.quiet {
        let report = validate_schedule(&store.state.placements, &store.state.electives, &input);
        print_summary(&store.state.placements, &store.state.electives, &report);
    }
    Ok(())
}

fn cmd_electives(
    data: &PathBuf,
    store_path: &PathBuf,
    theory_needed: u32,
    lab_needed: u32,
    clear_existing: bool,
) -> Result<()> {
    let input = load_input_from_dir(data).context("Failed to load input data")?;
    validate_input(&input)?;

    let mut store = ScheduleStore::open(store_path)?;
    let summary = run_electives(&input, &mut store, theory_needed, lab_needed, clear_existing)?;
    print_run_summary("electives", &summary);
    Ok(())
}

fn cmd_teachers(data: &PathBuf, store_path: &PathBuf, clear: bool) -> Result<()> {
    let input = load_input_from_dir(data).context("Failed to load input data")?;
    validate_input(&input)?;

    let mut store = ScheduleStore::open(store_path)?;
    let report = run_teacher_assignment(&input, &mut store, clear)?;

    println!(
        "Assigned {} of {} open slots ({} left)",
        report.assigned, report.total_slots, report.unassigned
    );
    for warning in &report.warnings {
        println!("  {}", warning);
    }
    Ok(())
}

fn cmd_validate(data: &PathBuf, store_path: &PathBuf, verbose: bool) -> Result<()> {
    let input = load_input_from_dir(data).context("Failed to load input data")?;
    let store = ScheduleStore::open(store_path)?;

    let report = validate_schedule(&store.state.placements, &store.state.electives, &input);
    if report.is_valid {
        println!("{}", "✓ Schedule is valid".green().bold());
    } else {
        println!("{}", "✗ Schedule has violations".red().bold());
        for v in &report.violations {
            println!("  - {}: {}", v.constraint.red(), v.message);
        }
    }

    if verbose {
        println!("\n{}", "Statistics:".bold());
        println!("  Placements: {}", report.statistics.total_placements);
        println!("  Electives: {}", report.statistics.elective_placements);
        println!("  Sections: {}", report.statistics.sections);
        println!(
            "  Teacher-assigned: {}",
            report.statistics.assigned_teachers
        );
    }
    Ok(())
}

fn cmd_report(data: &PathBuf, store_path: &PathBuf, output: &PathBuf, format: &str) -> Result<()> {
    let input = load_input_from_dir(data).context("Failed to load input data")?;
    let store = ScheduleStore::open(store_path)?;

    let report = validate_schedule(&store.state.placements, &store.state.electives, &input);
    let formats = parse_formats(format);
    generate_reports(
        &store.state.placements,
        &store.state.electives,
        &input,
        &report,
        output,
        &formats,
    )?;
    println!(
        "Reports written to: {}",
        output.display().to_string().green()
    );
    Ok(())
}

fn run_demo() -> Result<()> {
    println!("{}", "University Timetabler Demo".bold().cyan());
    println!("{}", "─".repeat(40));

    let demo_path = PathBuf::from("data/demo");
    let store_path = PathBuf::from("output/timetable-store.json");
    let output_path = PathBuf::from("output");

    if !demo_path.join("roadmap.json").exists() {
        println!("{}", "Demo data not found. Creating sample data...".yellow());
        create_demo_data(&demo_path)?;
    }

    let input = load_input_from_dir(&demo_path).context("Failed to load demo data")?;
    let validation = validate_input(&input)?;
    for warning in &validation.warnings {
        println!("{} {}", "Warning:".yellow(), warning);
    }
    println!(
        "Loaded {} semesters, {} rooms, {} electives, {} preferences",
        input.courses_by_semester.len(),
        input.rooms.len(),
        input.electives.len(),
        input.preferences.len()
    );

    std::fs::create_dir_all(&output_path)?;
    let mut store = ScheduleStore::open(&store_path)?;

    let main_summary = run_main(
        &input,
        &mut store,
        &MainRunOptions {
            quiet: false,
            ..MainRunOptions::default()
        },
    )?;
    print_run_summary("main schedule", &main_summary);

    let elective_summary = run_electives(&input, &mut store, 2, 1, true)?;
    print_run_summary("electives", &elective_summary);

    let teacher_report = run_teacher_assignment(&input, &mut store, true)?;
    println!(
        "✓ teachers: assigned {} of {} open slots",
        teacher_report.assigned, teacher_report.total_slots
    );

    let report = validate_schedule(&store.state.placements, &store.state.electives, &input);
    print_summary(&store.state.placements, &store.state.electives, &report);

    generate_reports(
        &store.state.placements,
        &store.state.electives,
        &input,
        &report,
        &output_path,
        &[OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Text],
    )?;
    println!(
        "Reports written to: {}",
        output_path.display().to_string().green()
    );

    Ok(())
}

fn parse_formats(format: &str) -> Vec<OutputFormat> {
    if format == "all" {
        return vec![OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Text];
    }

    format
        .split(',')
        .filter_map(|f| match f.trim().to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "text" | "txt" => Some(OutputFormat::Text),
            _ => None,
        })
        .collect()
}

fn create_demo_data(path: &PathBuf) -> Result<()> {
    std::fs::create_dir_all(path)?;

    let roadmap = serde_json::json!([
        {"semester": 1, "course_code": "CS111", "course_name": "Programming I", "is_lab": false, "times_needed": 2},
        {"semester": 1, "course_code": "CS111L", "course_name": "Programming I Lab", "is_lab": true, "times_needed": 1},
        {"semester": 1, "course_code": "MA101", "course_name": "Calculus I", "is_lab": false, "times_needed": 2},
        {"semester": 1, "course_code": "EN101", "course_name": "Academic English", "is_lab": false, "times_needed": 1},
        {"semester": 2, "course_code": "CS121", "course_name": "Programming II", "is_lab": false, "times_needed": 2},
        {"semester": 2, "course_code": "CS121L", "course_name": "Programming II Lab", "is_lab": true, "times_needed": 1},
        {"semester": 2, "course_code": "MA102", "course_name": "Calculus II", "is_lab": false, "times_needed": 2},
        {"semester": 2, "course_code": "PH101", "course_name": "Physics", "is_lab": false, "times_needed": 2}
    ]);
    std::fs::write(
        path.join("roadmap.json"),
        serde_json::to_string_pretty(&roadmap)?,
    )?;

    let rooms = serde_json::json!([
        {"room_name": "R101", "room_type": "theory", "capacity": 60},
        {"room_name": "R102", "room_type": "theory", "capacity": 60},
        {"room_name": "R103", "room_type": "theory", "capacity": 50},
        {"room_name": "LAB-1", "room_type": "lab", "capacity": 30},
        {"room_name": "LAB-2", "room_type": "lab", "capacity": 30}
    ]);
    std::fs::write(
        path.join("rooms.json"),
        serde_json::to_string_pretty(&rooms)?,
    )?;

    let capacities = serde_json::json!([
        {"semester": 1, "student_count": 90},
        {"semester": 2, "student_count": 70}
    ]);
    std::fs::write(
        path.join("student_capacity.json"),
        serde_json::to_string_pretty(&capacities)?,
    )?;

    let electives = serde_json::json!([
        {"elective_code": "EL-AI", "elective_name": "Intro to AI", "sections_count": 1, "can_use_theory": true, "can_use_lab": false},
        {"elective_code": "EL-ROB", "elective_name": "Robotics Workshop", "sections_count": 1, "can_use_theory": false, "can_use_lab": true}
    ]);
    std::fs::write(
        path.join("electives.json"),
        serde_json::to_string_pretty(&electives)?,
    )?;

    let special_labs = serde_json::json!([
        {"course_code": "CS121L", "room_name": "LAB-2"}
    ]);
    std::fs::write(
        path.join("special_labs.json"),
        serde_json::to_string_pretty(&special_labs)?,
    )?;

    let preferences = serde_json::json!([
        {"teacher": "Dr. Ayub", "course_code": "CS111", "sections_count": 2, "type": "theory"},
        {"teacher": "Dr. Ayub", "course_code": "CS121", "sections_count": 2, "type": "theory"},
        {"teacher": "Ms. Rahim", "course_code": "CS111L", "sections_count": 2, "type": "lab"},
        {"teacher": "Mr. Karim", "course_code": "*", "sections_count": 10, "type": "*"}
    ]);
    std::fs::write(
        path.join("teacher_preferences.json"),
        serde_json::to_string_pretty(&preferences)?,
    )?;

    println!("{}", "Demo data created successfully!".green());
    Ok(())
}
