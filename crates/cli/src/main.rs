//! Bookshelf CLI
//!
//! Runs the catalog API server, or drives a running one from the terminal.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use bookshelf_app::client::{is_known_genre, view, BookForm, CatalogController, CatalogQuery, GENRES};
use bookshelf_app::modules::books::query::SortKey;
use bookshelf_app::modules::books::validation::current_year;
use bookshelf_db::{DocumentId, ValidationErrors};
use bookshelf_kernel::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(about = "Bookshelf - personal book catalog")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// API root to talk to (overrides client.api_base_url)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the API server
    Serve,
    /// List books
    #[command(alias = "ls")]
    List {
        /// Case-insensitive match on title or author
        #[arg(short, long)]
        search: Option<String>,
        /// Exact genre, or "all"
        #[arg(short, long)]
        genre: Option<String>,
        /// newest, title, author, year or rating
        #[arg(long, default_value = "newest", value_parser = parse_sort)]
        sort: SortKey,
    },
    /// Show one book
    Show {
        /// Book ID
        id: String,
    },
    /// Add a book
    Add(AddArgs),
    /// Edit a book; only the given fields change
    Edit {
        /// Book ID
        id: String,
        #[command(flatten)]
        fields: EditArgs,
    },
    /// Delete a book
    #[command(alias = "rm")]
    Delete {
        /// Book ID
        id: String,
    },
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: String,
    #[arg(long)]
    genre: String,
    /// Published year
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    isbn: String,
    #[arg(long)]
    description: Option<String>,
    /// 1 to 5
    #[arg(long)]
    rating: Option<i32>,
    #[arg(long)]
    cover_image: Option<String>,
}

#[derive(Args, Debug, Default)]
struct EditArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    isbn: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    rating: Option<i32>,
    #[arg(long)]
    cover_image: Option<String>,
}

fn parse_sort(raw: &str) -> Result<SortKey, String> {
    SortKey::ALL
        .into_iter()
        .find(|key| key.as_str() == raw)
        .ok_or_else(|| {
            let known: Vec<_> = SortKey::ALL.iter().map(|k| k.as_str()).collect();
            format!("unknown sort '{raw}'; expected one of {}", known.join(", "))
        })
}

fn parse_id(raw: &str) -> Result<DocumentId> {
    DocumentId::parse(raw).ok_or_else(|| anyhow!("'{raw}' is not a book id"))
}

impl AddArgs {
    fn into_form(self, year: i32) -> BookForm {
        let mut form = BookForm::new(year);
        form.title = self.title;
        form.author = self.author;
        form.genre = self.genre;
        form.isbn = self.isbn;
        if let Some(published_year) = self.year {
            form.published_year = published_year;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(rating) = self.rating {
            form.rating = rating;
        }
        if let Some(cover_image) = self.cover_image {
            form.cover_image = cover_image;
        }
        form
    }
}

impl EditArgs {
    fn apply(self, form: &mut BookForm) {
        if let Some(title) = self.title {
            form.title = title;
        }
        if let Some(author) = self.author {
            form.author = author;
        }
        if let Some(genre) = self.genre {
            form.genre = genre;
        }
        if let Some(year) = self.year {
            form.published_year = year;
        }
        if let Some(isbn) = self.isbn {
            form.isbn = isbn;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(rating) = self.rating {
            form.rating = rating;
        }
        if let Some(cover_image) = self.cover_image {
            form.cover_image = cover_image;
        }
    }
}

fn invalid_form(errors: ValidationErrors) -> anyhow::Error {
    for error in errors.iter() {
        eprintln!("{}: {}", error.field, error.message);
    }
    anyhow!("book was not saved")
}

/// Print pending notifications; fail if any of them is an error.
fn report(controller: &CatalogController) -> Result<()> {
    let notifications = controller.state().notifications();
    let rendered = view::render_notifications(notifications);
    if !rendered.is_empty() {
        println!("{rendered}");
    }
    if notifications.has_errors() {
        bail!("request failed");
    }
    Ok(())
}

async fn submit(controller: &mut CatalogController, form: &BookForm) -> Result<()> {
    let genre = form.genre.trim();
    if !genre.is_empty() && !is_known_genre(genre) {
        eprintln!("note: '{genre}' is not a listed genre ({})", GENRES.join(", "));
    }
    let saved = controller
        .submit(form, current_year())
        .await
        .map_err(invalid_form)?;
    report(controller)?;
    if let Some(record) = saved {
        println!("\n{}", view::render_card(&record));
    }
    Ok(())
}

async fn run(command: Commands, settings: Settings) -> Result<()> {
    if let Commands::Serve = command {
        tracing::info!(env = ?settings.environment, "starting bookshelf server");
        return bookshelf_app::run(settings).await;
    }

    tracing::debug!(api = %settings.client.api_base_url, "using books API");
    let mut controller = CatalogController::from_settings(&settings.client);

    match command {
        Commands::Serve => {}
        Commands::List {
            search,
            genre,
            sort,
        } => {
            let mut query = CatalogQuery {
                sort,
                ..CatalogQuery::default()
            };
            if let Some(search) = search {
                query.search = search;
            }
            if let Some(genre) = genre {
                query.genre = genre;
            }
            controller.apply_query(query).await;
            report(&controller)?;
            println!("{}", view::render_catalog(controller.state()));
        }
        Commands::Show { id } => {
            let id = parse_id(&id)?;
            let Some(record) = controller.load(&id).await else {
                return report(&controller);
            };
            println!("{}", view::render_card(&record));
        }
        Commands::Add(args) => {
            let form = args.into_form(current_year());
            submit(&mut controller, &form).await?;
        }
        Commands::Edit { id, fields } => {
            let id = parse_id(&id)?;
            let Some(record) = controller.open_for_edit(&id).await else {
                return report(&controller);
            };
            let mut form = BookForm::from_record(&record);
            fields.apply(&mut form);
            submit(&mut controller, &form).await?;
        }
        Commands::Delete { id } => {
            let id = parse_id(&id)?;
            controller.delete(&id).await;
            report(&controller)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry);

    if let Some(api_url) = cli.api_url {
        settings.client.api_base_url = api_url;
    }

    run(cli.command, settings).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_parses_filters_and_sort() {
        let cli = Cli::try_parse_from([
            "bookshelf", "list", "--search", "dune", "--genre", "Sci-Fi", "--sort", "year",
        ])
        .unwrap();

        match cli.command {
            Commands::List {
                search,
                genre,
                sort,
            } => {
                assert_eq!(search.as_deref(), Some("dune"));
                assert_eq!(genre.as_deref(), Some("Sci-Fi"));
                assert_eq!(sort, SortKey::Year);
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn unknown_sort_is_rejected() {
        assert!(Cli::try_parse_from(["bookshelf", "list", "--sort", "pages"]).is_err());
    }

    #[test]
    fn api_url_is_global() {
        let cli = Cli::try_parse_from([
            "bookshelf",
            "delete",
            "0190f0c2-7a1b-7c3d-8e4f-5a6b7c8d9e01",
            "--api-url",
            "http://books.test/api",
        ])
        .unwrap();

        assert_eq!(cli.api_url.as_deref(), Some("http://books.test/api"));
    }

    #[test]
    fn add_requires_core_fields() {
        assert!(Cli::try_parse_from(["bookshelf", "add", "--title", "Dune"]).is_err());
    }

    #[test]
    fn add_builds_form_with_defaults() {
        let cli = Cli::try_parse_from([
            "bookshelf", "add", "--title", "Dune", "--author", "Frank Herbert", "--genre",
            "Sci-Fi", "--isbn", "111",
        ])
        .unwrap();

        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        let form = args.into_form(2024);

        assert_eq!(form.published_year, 2024);
        assert_eq!(form.rating, 1);
        assert!(form.validate(2024).is_ok());
    }

    #[test]
    fn edit_overrides_only_given_fields() {
        let mut form = BookForm {
            title: "Dune".to_string(),
            ..BookForm::new(2024)
        };

        EditArgs {
            rating: Some(5),
            ..Default::default()
        }
        .apply(&mut form);

        assert_eq!(form.title, "Dune");
        assert_eq!(form.rating, 5);
    }

    #[test]
    fn malformed_id_is_rejected_locally() {
        assert!(parse_id("not-a-uuid").is_err());
    }
}
