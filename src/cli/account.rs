use clap::Subcommand;

use crate::account::types::*;
use crate::account::{AccountService, CredentialHasher};
use crate::config::ServiceConfig;
use crate::storage::SledCollection;

#[derive(Subcommand)]
pub enum AccountCommands {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Query {
        #[arg(long)]
        id: String,
    },
    QueryByEmail {
        #[arg(long)]
        email: String,
    },
    Destroy {
        #[arg(long)]
        id: String,
    },
}

pub fn handle_account_command(
    cmd: AccountCommands,
    config: &ServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = SledCollection::open(&config.store)?;
    let hasher = CredentialHasher::new(&config.hashing)?;
    let service = AccountService::new(&store, &hasher, &config.auth);

    let result = run(&service, cmd);
    store.close()?;
    result
}

fn run(service: &AccountService, cmd: AccountCommands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        AccountCommands::Create { name, email, password } => {
            let reply = service.create(&CreateArgs { name, email, password })?;
            println!("{}", reply.id);
        }
        AccountCommands::Query { id } => {
            let reply = service.query(&QueryArgs { id })?;
            println!("Name: {}\tEmail: {}", reply.name, reply.email);
        }
        AccountCommands::QueryByEmail { email } => {
            let reply = service.query_by_email(&QueryByEmailArgs { email })?;
            println!("Id: {}\tName: {}", reply.id, reply.name);
        }
        AccountCommands::Destroy { id } => {
            service.destroy(&DestroyArgs { id: id.clone() })?;
            println!("Account {} destroyed", id);
        }
    }
    Ok(())
}
