use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

pub mod commands;

use crate::config::DEFAULT_DATABASE_URL;
use compute::recurring::NewRecurringTemplate;
use commands::{
    add_recurring, budget_status, delete_recurring, generate_recurring, init_database,
    list_recurring,
};

#[derive(Parser, Debug)]
#[command(name = "expense-tracker")]
#[command(about = "Personal expense tracker: recurring expenses and monthly budgets")]
#[command(version)]
pub struct Cli {
    /// Database URL
    ///
    /// For SQLite databases, use:
    ///   - sqlite://relative/path/expenses.db
    ///   - sqlite:///absolute/path/expenses.db
    #[arg(short, long, global = true, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Initialize the database using migrations
    InitDb,
    /// Create all due occurrences of the recurring expenses
    ///
    /// Meant to run once a day. Catches up on every occurrence that was
    /// missed since the last run.
    GenerateRecurring {
        /// Run as of this moment instead of the current local time
        ///
        /// Format: YYYY-MM-DDTHH:MM:SS
        #[arg(long)]
        now: Option<NaiveDateTime>,
    },
    /// Add a recurring expense
    AddRecurring {
        #[arg(short, long)]
        user_id: i32,

        #[arg(long)]
        title: String,

        /// At least 0.01
        #[arg(short, long)]
        amount: Decimal,

        /// One of: daily, weekly, monthly, yearly
        #[arg(short, long)]
        frequency: String,

        /// First occurrence, YYYY-MM-DD
        #[arg(short, long)]
        start_date: NaiveDate,

        /// Last possible occurrence, YYYY-MM-DD
        #[arg(short, long)]
        end_date: Option<NaiveDate>,

        #[arg(short, long)]
        category_id: Option<i32>,

        #[arg(long)]
        description: Option<String>,
    },
    /// List a user's recurring expenses
    ListRecurring {
        #[arg(short, long)]
        user_id: i32,
    },
    /// Delete a recurring expense together with its occurrences
    DeleteRecurring {
        /// User performing the deletion; must own the expense
        #[arg(short, long)]
        user_id: i32,

        #[arg(short, long)]
        template_id: i32,
    },
    /// Show how much of each budget has been spent
    BudgetStatus {
        #[arg(short, long)]
        user_id: i32,

        /// Month 1-12, defaults to the current month
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,

        /// Defaults to the current year
        #[arg(short, long)]
        year: Option<i32>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let database_url = self.database_url.as_str();
        match self.command {
            Commands::InitDb => {
                init_database(database_url).await?;
            }
            Commands::GenerateRecurring { now } => {
                generate_recurring(database_url, now).await?;
            }
            Commands::AddRecurring {
                user_id,
                title,
                amount,
                frequency,
                start_date,
                end_date,
                category_id,
                description,
            } => {
                let input = NewRecurringTemplate {
                    category_id,
                    amount,
                    title,
                    description,
                    frequency,
                    start_date,
                    end_date,
                };
                add_recurring(database_url, user_id, input).await?;
            }
            Commands::ListRecurring { user_id } => {
                list_recurring(database_url, user_id).await?;
            }
            Commands::DeleteRecurring { user_id, template_id } => {
                delete_recurring(database_url, user_id, template_id).await?;
            }
            Commands::BudgetStatus { user_id, month, year } => {
                budget_status(database_url, user_id, month, year).await?;
            }
        }
        Ok(())
    }
}
