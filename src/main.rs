use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use env_logger::{Builder, Target};
use iced::futures::stream;
use iced::keyboard::{self, key, Key, Modifiers};
use iced::widget::{
    button, column, container, image, opaque, row, scrollable, stack, text, Column,
};
use iced::{Alignment, Color, ContentFit, Element, Length, Subscription, Task, Theme};
use iced_aw::Wrap;
use log::LevelFilter;
use rfd::FileDialog;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Mutex;

use hotel_catalog::config::CatalogConfig;
use hotel_catalog::error::PreferenceError;
use hotel_catalog::runtime::{Event, TokioScheduler};
use hotel_catalog::session::Session;
use hotel_catalog::source::FileDataSource;
use hotel_catalog::state::filter::FilterId;
use hotel_catalog::state::gallery::GalleryKey;
use hotel_catalog::state::listing::ListingStatus;
use hotel_catalog::state::pagination::ScrollMetrics;
use hotel_catalog::state::preference::{PreferenceStore, SqlitePreferences};
use hotel_catalog::view::item::{ItemView, ViewContext, ViewToken, Visual};
use hotel_catalog::view::preview::{resolve_url, DiskImageLoader};

const CARD_WIDTH: f32 = 280.0;
const CARD_HEIGHT: f32 = 220.0;

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse a hotel catalog.", long_about = None)]
struct Args {
    /// Catalog JSON file; a file picker opens when neither this nor the
    /// config names one
    #[arg(long)]
    data: Option<PathBuf>,

    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Main application state
struct HotelCatalog {
    session: Session,
    /// Completions coming back from the scheduler
    events: Arc<Mutex<UnboundedReceiver<Event>>>,
    /// Resolves gallery photo URLs
    base_dir: PathBuf,
    /// Runs fetches, image loads and timers
    runtime: Option<Runtime>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// An asynchronous completion for the session
    Core(Event),
    FilterChosen(FilterId),
    Scrolled(ScrollMetrics),
    CardClicked(ViewToken),
    FavouriteClicked(ViewToken),
    Key(GalleryKey),
    CloseGallery,
}

impl HotelCatalog {
    fn new(args: &Args) -> Result<Option<Self>, Box<dyn std::error::Error>> {
        let mut config = CatalogConfig::load(args.config.as_deref())?;
        if let Some(data) = &args.data {
            config.data_path = Some(data.clone());
        }

        let data_path = match config.data_path.clone() {
            Some(path) => path,
            None => match FileDialog::new()
                .set_title("Select Hotel Catalog")
                .add_filter("JSON", &["json"])
                .pick_file()
            {
                Some(path) => path,
                None => return Ok(None),
            },
        };

        let preferences = open_preferences(&config);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("hotel-catalog-io")
            .enable_all()
            .build()?;

        let source = FileDataSource::new(&data_path);
        let base_dir = source.base_dir();
        let (scheduler, events) = TokioScheduler::channel(runtime.handle().clone());
        let ctx = ViewContext {
            loader: Arc::new(DiskImageLoader::new(&base_dir)),
            scheduler: Arc::new(scheduler),
            image_timeout: config.image_timeout(),
        };

        let mut session = Session::new(&config, ctx, preferences);
        session.start(Arc::new(source));
        println!("🏨 Hotel catalog opened {}", data_path.display());

        Ok(Some(Self {
            session,
            events: Arc::new(Mutex::new(events)),
            base_dir,
            runtime: Some(runtime),
        }))
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Core(event) => self.session.handle(event),
            Message::FilterChosen(filter) => self.session.choose_filter(filter.as_str()),
            Message::Scrolled(metrics) => self.session.scrolled(metrics),
            Message::CardClicked(token) => {
                if self.session.card_clicked(token) {
                    log::debug!("gallery opened from {token:?}");
                }
            }
            Message::FavouriteClicked(token) => {
                if let Some(on) = self.session.favourite_clicked(token) {
                    log::debug!("{token:?} favourite is now {on}");
                }
            }
            Message::Key(key) => {
                self.session.key_pressed(key);
            }
            Message::CloseGallery => {
                self.session.close_gallery();
            }
        }

        Task::none()
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let listing = self.session.listing();
        let active = listing.active_filter();

        let filters = FilterId::ALL.iter().fold(row![].spacing(8), |filters, &filter| {
            let style: fn(&Theme, button::Status) -> button::Style = if active == Some(filter) {
                button::primary
            } else {
                button::secondary
            };
            filters.push(
                button(text(filter.label()))
                    .style(style)
                    .on_press(Message::FilterChosen(filter)),
            )
        });

        let status = match listing.status() {
            ListingStatus::Idle | ListingStatus::Loading => text("Loading hotels..."),
            ListingStatus::Failed(err) => text(format!("❌ {err}")),
            ListingStatus::Ready => match listing.state() {
                Some(state) if state.ordered().is_empty() => text("No hotels in this catalog."),
                Some(state) => text(format!(
                    "{} of {} hotels",
                    listing.views().len(),
                    state.ordered().len()
                )),
                None => text(""),
            },
        };

        let cards: Vec<Element<Message>> =
            listing.views().iter().map(|view| self.card(view)).collect();
        let grid = scrollable(
            container(Wrap::with_elements(cards).spacing(12.0).line_spacing(12.0))
                .width(Length::Fill)
                .padding(12),
        )
        .height(Length::Fill)
        .on_scroll(|viewport| {
            let offset = viewport.absolute_offset();
            Message::Scrolled(ScrollMetrics {
                list_bottom: viewport.content_bounds().height - offset.y,
                viewport_height: viewport.bounds().height,
            })
        });

        let content: Column<Message> = column![
            text("Hotel Catalog").size(32),
            filters,
            status.size(14),
            grid,
        ]
        .spacing(16)
        .padding(20);

        match self.gallery() {
            Some(overlay) => stack![content, overlay].into(),
            None => content.into(),
        }
    }

    fn card<'a>(&'a self, view: &'a ItemView) -> Element<'a, Message> {
        let item = view.item();

        let background: Element<Message> = match view.visual() {
            Visual::Background(handle) => image(image::Handle::from_path(&handle.source))
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Cover)
                .into(),
            Visual::Pending => placeholder("..."),
            Visual::NoPhoto => placeholder("No photo"),
        };

        let rating = if item.has_styled_rating() {
            text(format!("{:.1}", item.rating_score))
                .color(rating_color(item.rating_band()))
        } else {
            text(format!("{:.1}", item.rating_score))
        };

        let heart = if self.session.listing().is_favourite(item.id) {
            "♥"
        } else {
            "♡"
        };

        let amenities = item
            .amenities
            .iter()
            .map(|amenity| amenity.label())
            .collect::<Vec<_>>()
            .join(" · ");

        let details = container(
            column![
                row![
                    text(&item.name).size(18).width(Length::Fill),
                    button(text(heart))
                        .on_press(Message::FavouriteClicked(view.token()))
                        .style(button::text),
                ]
                .align_y(Alignment::Center),
                text(item.stars_label()),
                row![text(item.distance_label()), rating].spacing(12),
                text(amenities).size(12),
                text(item.price_label()).size(20),
            ]
            .spacing(4),
        )
        .padding(10)
        .height(Length::Fill)
        .align_y(Alignment::End)
        .style(container::rounded_box);

        button(stack![background, details])
            .on_press(Message::CardClicked(view.token()))
            .width(CARD_WIDTH)
            .height(CARD_HEIGHT)
            .padding(0)
            .style(button::text)
            .into()
    }

    fn gallery(&self) -> Option<Element<Message>> {
        let gallery = self.session.gallery();
        let photo = gallery.current_photo()?;
        let index = gallery.current_index().unwrap_or(0);
        let path = resolve_url(&self.base_dir, photo);

        let overlay = container(
            column![
                row![
                    text(format!("{} / {}", index + 1, gallery.photo_count()))
                        .width(Length::Fill),
                    button(text("✕")).on_press(Message::CloseGallery),
                ]
                .align_y(Alignment::Center),
                image(image::Handle::from_path(path))
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .content_fit(ContentFit::Contain),
                text("← → to browse, Esc to close").size(12),
            ]
            .spacing(12)
            .padding(24),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .style(|_theme: &Theme| container::Style {
            background: Some(Color::from_rgba(0.0, 0.0, 0.0, 0.85).into()),
            ..container::Style::default()
        });

        Some(opaque(overlay))
    }

    fn subscription(&self) -> Subscription<Message> {
        let events = Arc::clone(&self.events);
        let core = Subscription::run_with_id(
            std::any::TypeId::of::<Event>(),
            stream::unfold(events, |events| async move {
                let event = events.lock().await.recv().await?;
                Some((Message::Core(event), events))
            }),
        );

        // Keyboard only while the gallery listens for it
        if self.session.gallery().listens_to_keyboard() {
            Subscription::batch([core, keyboard::on_key_press(gallery_key)])
        } else {
            core
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

impl Drop for HotelCatalog {
    fn drop(&mut self) {
        self.session.shutdown();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn placeholder(label: &str) -> Element<'_, Message> {
    container(text(label).size(12))
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

fn rating_color(band: u8) -> Color {
    match band {
        9.. => Color::from_rgb8(0x2e, 0x9e, 0x4f),
        7..=8 => Color::from_rgb8(0x7c, 0xb3, 0x42),
        5..=6 => Color::from_rgb8(0xe0, 0xa8, 0x00),
        _ => Color::from_rgb8(0xd9, 0x53, 0x4f),
    }
}

fn gallery_key(key: Key, _modifiers: Modifiers) -> Option<Message> {
    let key = match key.as_ref() {
        Key::Named(key::Named::Escape) => GalleryKey::Escape,
        Key::Named(key::Named::ArrowLeft) => GalleryKey::Left,
        Key::Named(key::Named::ArrowRight) => GalleryKey::Right,
        _ => GalleryKey::Other,
    };
    Some(Message::Key(key))
}

fn open_preferences(config: &CatalogConfig) -> Box<dyn PreferenceStore> {
    let path = config
        .preferences_path
        .clone()
        .or_else(SqlitePreferences::default_path);

    let opened = match path {
        Some(path) => SqlitePreferences::open(&path),
        None => SqlitePreferences::open_in_memory(),
    };

    match opened {
        Ok(store) => Box::new(store),
        Err(err) => {
            log::warn!("preferences unavailable ({err}), keeping them in memory");
            match SqlitePreferences::open_in_memory() {
                Ok(store) => Box::new(store),
                Err(err) => {
                    log::error!("in-memory preferences failed too: {err}");
                    Box::new(Volatile::default())
                }
            }
        }
    }
}

/// Last-resort preference store that forgets everything on exit
#[derive(Debug, Default)]
struct Volatile(std::collections::HashMap<String, String>);

impl PreferenceStore for Volatile {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.0.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.0.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn init_logger() {
    Builder::new()
        .target(Target::Stdout)
        .filter_level(LevelFilter::Warn)
        .filter_module("hotel_catalog", LevelFilter::Debug)
        .init();
}

fn main() -> iced::Result {
    if std::env::var("RUST_LOG").is_err() {
        init_logger();
    } else {
        env_logger::init();
    }

    let args = Args::parse();
    let catalog = match HotelCatalog::new(&args) {
        Ok(Some(catalog)) => catalog,
        Ok(None) => {
            println!("No catalog selected, bye 👋");
            return Ok(());
        }
        Err(err) => {
            log::error!("failed to start: {err}");
            std::process::exit(1);
        }
    };

    iced::application("Hotel Catalog", HotelCatalog::update, HotelCatalog::view)
        .subscription(HotelCatalog::subscription)
        .theme(HotelCatalog::theme)
        .centered()
        .run_with(move || (catalog, Task::none()))
}
