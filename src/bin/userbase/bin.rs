use clap::{crate_description, crate_version, Arg, ArgAction, ArgMatches, Command};
use log::{error, info};
use serde::Serialize;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use userbase::{DatabaseFactory, DateFormat, LogNotifier, RegistrationForm};

mod config;

fn field(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .help(help)
        .action(ArgAction::Set)
        .num_args(1)
}

// secrets can come from the environment instead of the command line
fn secret(id: &'static str, help: &'static str, env: &'static str) -> Arg {
    field(id, help).env(env).hide_env_values(true)
}

fn value(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            error!("{:?}", err);
            std::process::exit(1);
        }
    }
}

fn cli() -> Command {
    Command::new("userbase")
        .about(crate_description!())
        .version(format!("v{}", crate_version!()))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommands([
            Command::new("init").about("Create the users and profiles schema"),
            Command::new("register")
                .about("Register a new profile")
                .args([
                    field("name", "Full name, letters digits and spaces"),
                    field("birth", "Birth date, e.g. 25/12/1990"),
                    field("username", "Unique username"),
                    field("email", "Unique email address"),
                    secret("password", "At least 6 characters", "USERBASE_PASSWORD"),
                    secret(
                        "confirm-password",
                        "Must equal --password",
                        "USERBASE_CONFIRM_PASSWORD",
                    ),
                    field("weight", "Kilograms, a comma may separate decimals"),
                    field("height", "Meters, a comma may separate decimals"),
                    Arg::new("date-format")
                        .long("date-format")
                        .help("How --birth is written: UK, US or ISO")
                        .env("USERBASE_DATE_FORMAT")
                        .default_value("UK"),
                ]),
            Command::new("login")
                .about("Log in with a username or email")
                .args([
                    field("identifier", "Username or email"),
                    secret("password", "Password", "USERBASE_PASSWORD"),
                ]),
        ])
}

#[tokio::main]
async fn main() {
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("Failed to initialize logger");

    let matches = cli().get_matches();

    let (driver, params) = match config::connection() {
        Ok(c) => c,
        Err(err) => {
            error!("{:?}", err);
            std::process::exit(1);
        }
    };

    let factory = DatabaseFactory::new();
    let connector = match factory.get_database(&driver, params) {
        Ok(connector) => connector,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };
    let notifier = LogNotifier;

    match matches.subcommand() {
        Some(("init", ..)) => match userbase::provision_database(connector.as_ref()).await {
            Err(err) => {
                error!("{}", err);
                std::process::exit(1);
            }
            Ok(_) => info!("Success"),
        },
        Some(("register", query_matches)) => {
            let format = match DateFormat::new(&value(query_matches, "date-format")) {
                Ok(format) => format,
                Err(err) => {
                    error!("{}", err);
                    std::process::exit(1);
                }
            };

            let mut form = RegistrationForm {
                name: value(query_matches, "name"),
                birth: value(query_matches, "birth"),
                username: value(query_matches, "username"),
                email: value(query_matches, "email"),
                password: value(query_matches, "password"),
                confirm_password: value(query_matches, "confirm-password"),
                weight: value(query_matches, "weight"),
                height: value(query_matches, "height"),
            };

            match userbase::register(connector.as_ref(), &notifier, &mut form, format).await {
                Some(profile) => print_json(&profile),
                None => std::process::exit(1),
            }
        }
        Some(("login", query_matches)) => {
            let identifier = value(query_matches, "identifier");
            let password = value(query_matches, "password");

            match userbase::login(connector.as_ref(), &notifier, &identifier, &password).await {
                Some(user) => print_json(&user),
                None => std::process::exit(1),
            }
        }
        _ => unreachable!(), // If all subcommands are defined above, anything else is unreachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_passwords_fall_back_to_env() {
        env::set_var("USERBASE_PASSWORD", "analytical");
        env::set_var("USERBASE_CONFIRM_PASSWORD", "analytical");

        let matches = cli()
            .try_get_matches_from(["userbase", "register", "--username", "ada"])
            .unwrap();
        let (_, register) = matches.subcommand().unwrap();
        assert_eq!(value(register, "password"), "analytical");
        assert_eq!(value(register, "confirm-password"), "analytical");

        let matches = cli()
            .try_get_matches_from(["userbase", "login", "--identifier", "ada"])
            .unwrap();
        let (_, login) = matches.subcommand().unwrap();
        assert_eq!(value(login, "password"), "analytical");

        env::remove_var("USERBASE_PASSWORD");
        env::remove_var("USERBASE_CONFIRM_PASSWORD");
    }

    #[test]
    #[serial]
    fn test_password_flag_wins_over_env() {
        env::set_var("USERBASE_PASSWORD", "from-env");

        let matches = cli()
            .try_get_matches_from(["userbase", "login", "--password", "from-flag"])
            .unwrap();
        let (_, login) = matches.subcommand().unwrap();
        assert_eq!(value(login, "password"), "from-flag");

        env::remove_var("USERBASE_PASSWORD");
    }
}
