use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use ruledesk_client::RuleStoreClient;
use ruledesk_core::{config::load_api_config, logging::init_tracing, serde_utils::from_json_file};
use ruledesk_rules::{
    conditions_from_value, extract_facts, filter_facts, generate_name_from_path,
    matching_indices, CannedEvaluator, JsonPath, RuleApiBuilder, RuleEvaluator,
    RuleServiceConfig, RuleStore, StoreSeed, Template,
};
use tracing::info;

mod support;

use support::{
    check_payload, lint_paths, payload_of, print_conditions, print_facts, print_lint,
    print_outcome, print_rules, print_saved, print_toggled, print_valid, read_conditions,
    read_json, read_rule, read_template, to_pretty, CliError,
};

#[derive(Parser)]
#[command(name = "ruledesk")]
#[command(about = "RuleDesk - edit, validate and test rule conditions", long_about = None)]
struct Cli {
    /// Base URL of the rule API
    #[arg(long, global = true, env = "RULEDESK_API_BASE_URL")]
    api_url: Option<String>,
    #[arg(long, global = true, env = "RULEDESK_LOG", default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a condition payload without contacting the service
    Validate {
        /// JSON file holding a condition array or a rule (`-` for stdin)
        file: PathBuf,
    },
    /// List the facts (paths and values) of a sample document
    Facts(FactsArgs),
    /// Print display names generated from JSON paths
    Name {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Find conditions mentioning some text
    Search {
        file: PathBuf,
        text: String,
    },
    /// Describe every top-level condition of a payload
    Describe {
        file: PathBuf,
        /// Template used for display names
        #[arg(long)]
        template: Option<PathBuf>,
    },
    /// Manage rules stored in the rule service
    #[command(subcommand)]
    Rules(RulesCommands),
    /// Manage path templates
    #[command(subcommand)]
    Template(TemplateCommands),
    /// Run a payload against a document on the evaluation service
    Test {
        /// Condition array or rule file
        file: PathBuf,
        /// Document to evaluate
        #[arg(long)]
        input: PathBuf,
    },
    /// Run the rule service locally
    Serve(ServeArgs),
    /// Show version information
    Version,
}

#[derive(Args)]
struct FactsArgs {
    file: PathBuf,
    /// Keep facts whose path or value contains this text
    #[arg(long)]
    filter: Option<String>,
    /// Print facts as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Subcommand)]
enum RulesCommands {
    /// List the rules of a tenant
    List {
        #[arg(long, env = "RULEDESK_TENANT")]
        tenant: String,
        #[arg(long)]
        key: Option<String>,
    },
    /// Print one rule as JSON
    Show { rule_id: String },
    /// Validate and store a rule file
    Push { file: PathBuf },
    Enable(ToggleArgs),
    Disable(ToggleArgs),
}

#[derive(Args)]
struct ToggleArgs {
    rule_id: String,
    #[arg(long)]
    modified_by: Option<String>,
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// Build a template from the paths a payload references
    Generate { file: PathBuf },
    /// Print the stored template of a rule
    Pull { rule_id: String },
    /// Replace the stored template of a rule
    Push { rule_id: String, file: PathBuf },
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "RULEDESK_BIND", default_value = "0.0.0.0:8080")]
    bind: String,
    /// JSON file with initial rules, templates and payloads
    #[arg(long)]
    seed: Option<PathBuf>,
    /// Forward test requests to this evaluation service
    #[arg(long)]
    evaluator_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(Some(cli.log_level.as_str()))?;

    match cli.command {
        Commands::Validate { file } => {
            let payload = payload_of(read_json(&file)?);
            let count = check_payload(&payload)?;
            print_valid(count);
            print_lint(&lint_paths(&conditions_from_value(payload)?));
        }
        Commands::Facts(args) => {
            let document = read_json(&args.file)?;
            let facts = extract_facts(&document);
            let shown = filter_facts(&facts, args.filter.as_deref().unwrap_or_default());
            if args.json {
                println!("{}", to_pretty(&shown)?);
            } else {
                print_facts(&shown);
            }
        }
        Commands::Name { paths } => {
            for path in paths {
                if let Err(err) = JsonPath::from(path.as_str()).segments() {
                    println!("{} {path}: {err}", "⚠".yellow().bold());
                }
                println!("{}  {}", path.cyan(), generate_name_from_path(&path));
            }
        }
        Commands::Search { file, text } => {
            let conditions = read_conditions(&file)?;
            let indices = matching_indices(&conditions, &text);
            print_conditions(&conditions, &indices, &Template::from_conditions(&conditions));
        }
        Commands::Describe { file, template } => {
            let conditions = read_conditions(&file)?;
            let template = match template {
                Some(path) => Template::from_entries(read_template(&path)?)
                    .map_err(ruledesk_rules::RuleError::from)?,
                None => Template::from_conditions(&conditions),
            };
            let indices = (0..conditions.len()).collect::<Vec<_>>();
            print_conditions(&conditions, &indices, &template);
        }
        Commands::Template(TemplateCommands::Generate { file }) => {
            let conditions = read_conditions(&file)?;
            println!("{}", to_pretty(&Template::from_conditions(&conditions))?);
        }
        Commands::Serve(args) => serve(args).await?,
        Commands::Version => {
            println!("RuleDesk v{}", env!("CARGO_PKG_VERSION"));
        }
        command => {
            let mut config = load_api_config()?;
            if let Some(api_url) = cli.api_url {
                config.base_url = api_url;
            }
            let client = RuleStoreClient::new(&config)?;

            match command {
                Commands::Rules(RulesCommands::List { tenant, key }) => {
                    print_rules(&client.list_rules(&tenant, key.as_deref()).await?);
                }
                Commands::Rules(RulesCommands::Show { rule_id }) => {
                    println!("{}", to_pretty(&client.get_rule(&rule_id).await?)?);
                }
                Commands::Rules(RulesCommands::Push { file }) => {
                    let rule = read_rule(&file)?;
                    print_saved(&client.save_rule(&rule).await?);
                }
                Commands::Rules(RulesCommands::Enable(args)) => {
                    let rule = client
                        .set_enabled(&args.rule_id, true, args.modified_by)
                        .await?;
                    print_toggled(&rule);
                }
                Commands::Rules(RulesCommands::Disable(args)) => {
                    let rule = client
                        .set_enabled(&args.rule_id, false, args.modified_by)
                        .await?;
                    print_toggled(&rule);
                }
                Commands::Template(TemplateCommands::Pull { rule_id }) => {
                    println!("{}", to_pretty(&client.get_template(&rule_id).await?)?);
                }
                Commands::Template(TemplateCommands::Push { rule_id, file }) => {
                    let entries = read_template(&file)?;
                    let template = client.save_template(&rule_id, &entries).await?;
                    println!(
                        "{} {} ({} path(s))",
                        "✔ Template saved:".green().bold(),
                        rule_id.bold(),
                        template.len()
                    );
                }
                Commands::Test { file, input } => {
                    let conditions = read_conditions(&file)?;
                    let document = read_json(&input)?;
                    print_outcome(&client.test_rule(&document, &conditions).await?)?;
                }
                _ => {}
            }
        }
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> Result<(), CliError> {
    let store = match &args.seed {
        Some(path) => RuleStore::from_seed(from_json_file::<StoreSeed>(path)?)?,
        None => RuleStore::new(),
    };

    let evaluator: Arc<dyn RuleEvaluator> = match &args.evaluator_url {
        Some(url) => Arc::new(RuleStoreClient::new(&ruledesk_core::ApiConfig::new(url.clone()))?),
        None => Arc::new(CannedEvaluator::default()),
    };

    let config = RuleServiceConfig {
        bind_address: args.bind,
        endpoints: load_api_config()?.endpoints,
        ..RuleServiceConfig::default()
    };
    let (addr, shutdown) = RuleApiBuilder::new(store, evaluator).serve(config).await?;
    println!("{} http://{}", "✔ Rule service listening on".green().bold(), addr);

    tokio::signal::ctrl_c()
        .await
        .map_err(|err| CliError::Server(err.to_string()))?;
    info!("shutting down rule service");
    let _ = shutdown.send(());
    Ok(())
}
