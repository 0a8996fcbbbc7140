//! quill CLI — command dispatch and user-visible output.
//!
//! Every invocation exits with status 0, including failures; failures are
//! reported as single-line messages on stdout.

use std::env;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use quill_core::commit::Commit;
use quill_core::{MergeOutcome, QuillResult, Repository};

#[derive(Parser)]
#[command(name = "quill", about = "quill — a tiny local version-control system", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty repository with an initial commit.
    Init,

    /// Stage a file's current content for the next commit.
    Add { path: String },

    /// Record staged changes as a new commit.
    Commit { message: String },

    /// Unstage a file, or mark a tracked file for removal.
    Rm { path: String },

    /// Show the first-parent history of the current branch.
    Log,

    /// Show every commit ever made.
    GlobalLog,

    /// Print the ids of commits with the given message.
    Find { message: String },

    /// Show branches and staged or removed files.
    Status,

    /// Switch branches, or restore a file from a commit.
    ///
    /// Forms: `checkout <branch>`, `checkout -- <path>`,
    /// `checkout <commit-id> -- <path>`.
    Checkout {
        /// Branch name, or a commit id when restoring a file.
        target: Option<String>,

        /// File to restore, given after `--`.
        #[arg(last = true)]
        path: Vec<String>,
    },

    /// Create a new branch at the current commit.
    Branch { name: String },

    /// Delete a branch pointer.
    RmBranch { name: String },

    /// Move the current branch to a commit and sync the working tree.
    Reset { commit_id: String },

    /// Merge a branch into the current branch.
    Merge { branch: String },
}

fn main() {
    env_logger::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = err.print();
                }
                ErrorKind::MissingSubcommand => println!("Please enter a command."),
                ErrorKind::InvalidSubcommand => println!("No command with that name exists."),
                _ => println!("Incorrect Operands"),
            }
            return;
        }
    };
    if let Err(err) = run(cli.command) {
        println!("{err}");
    }
}

fn run(command: Commands) -> QuillResult<()> {
    let cwd = env::current_dir()?;
    match command {
        Commands::Init => {
            Repository::init(&cwd)?;
        }
        Commands::Add { path } => Repository::open(&cwd)?.add(&path)?,
        Commands::Commit { message } => {
            Repository::open(&cwd)?.commit(&message)?;
        }
        Commands::Rm { path } => Repository::open(&cwd)?.remove(&path)?,
        Commands::Log => print_commits(&Repository::open(&cwd)?.log()?),
        Commands::GlobalLog => print_commits(&Repository::open(&cwd)?.log_all()?),
        Commands::Find { message } => {
            let ids = Repository::open(&cwd)?.find(&message)?;
            if ids.is_empty() {
                println!("Found no commit with that message.");
            } else {
                for id in ids {
                    println!("{id}");
                }
            }
        }
        Commands::Status => print_status(&Repository::open(&cwd)?)?,
        Commands::Checkout { target, path } => {
            let repo = Repository::open(&cwd)?;
            match (target, path.as_slice()) {
                (Some(branch), []) => repo.checkout_branch(&branch)?,
                (None, [file]) => repo.restore_path(file)?,
                (Some(commit_id), [file]) => repo.restore_path_at(&commit_id, file)?,
                _ => println!("Incorrect Operands"),
            }
        }
        Commands::Branch { name } => Repository::open(&cwd)?.create_branch(&name)?,
        Commands::RmBranch { name } => Repository::open(&cwd)?.delete_branch(&name)?,
        Commands::Reset { commit_id } => Repository::open(&cwd)?.reset(&commit_id)?,
        Commands::Merge { branch } => match Repository::open(&cwd)?.merge(&branch)? {
            MergeOutcome::FastForward => println!("Current branch fast-forwarded."),
            MergeOutcome::AlreadyUpToDate => {
                println!("Given branch is an ancestor of the current branch.")
            }
            MergeOutcome::Conflicted => println!("Encountered a merge conflict."),
            MergeOutcome::Merged(_) => {}
        },
    }
    Ok(())
}

fn print_commits(commits: &[Commit]) {
    for commit in commits {
        println!("===");
        println!("Commit {}", commit.id);
        println!("{}", commit.timestamp.format("%Y-%m-%d %H:%M:%S"));
        println!("{}", commit.message);
        println!();
    }
}

fn print_status(repo: &Repository) -> QuillResult<()> {
    let report = repo.status()?;
    println!("=== Branches ===");
    for branch in &report.branches {
        println!("{branch}");
    }
    println!();
    println!("=== Staged Files ===");
    for path in &report.staged {
        println!("{path}");
    }
    println!();
    println!("=== Removed Files ===");
    for path in &report.removed {
        println!("{path}");
    }
    println!();
    println!("=== Modifications Not Staged For Commit ===");
    println!();
    println!("=== Untracked Files ===");
    Ok(())
}
