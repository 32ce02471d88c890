//! Application session: one open document plus the state around it.
//!
//! Every user request is an [`Action`]. [`Session::dispatch`] applies it and
//! returns an [`Outcome`] or an error; [`Session::handle`] turns either into a
//! [`Notice`] for display, so no action can bring the application down.
//!
//! The canvas is re-rendered only when the data, style, view or basemap
//! changed since the previous render.

mod action;

pub use action::{Action, Notice, Outcome};

use std::path::{Path, PathBuf};

use tiny_skia::Pixmap;
use tracing::{debug, info, warn};

use crate::basemap::{BasemapImage, BasemapLoader};
use crate::coord::Bounds;
use crate::error::{NetworkError, ShapeditError, ValidationError};
use crate::provider::AsyncProvider;
use crate::render::{display_bounds, save_png, Renderer};
use crate::store::{self, FeatureCollection};
use crate::style::StyleConfig;
use crate::table::{AttributeTableView, Rows};
use crate::view::MapViewController;

/// State of the basemap layer, for status display.
#[derive(Debug, Clone, PartialEq)]
pub enum BasemapStatus {
    /// No provider configured.
    Disabled,
    /// The layer's CRS cannot be placed on Web Mercator tiles.
    Unsupported,
    Loading,
    Ready,
    Failed(NetworkError),
}

impl std::fmt::Display for BasemapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BasemapStatus::Disabled => f.write_str("basemap off"),
            BasemapStatus::Unsupported => f.write_str("no basemap for this CRS"),
            BasemapStatus::Loading => f.write_str("basemap loading"),
            BasemapStatus::Ready => f.write_str("basemap ready"),
            BasemapStatus::Failed(e) => write!(f, "basemap failed: {}", e),
        }
    }
}

struct Document {
    path: PathBuf,
    collection: FeatureCollection,
    style: StyleConfig,
    table: AttributeTableView,
    saved_revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RenderKey {
    generation: u64,
    data: u64,
    style: u64,
    view: u64,
    basemap: u64,
}

pub struct Session<P: AsyncProvider + 'static> {
    document: Option<Document>,
    /// Bumped whenever a different document is opened.
    generation: u64,
    style_revision: u64,
    view: MapViewController,
    renderer: Renderer,
    loader: Option<BasemapLoader<P>>,
    basemap: Option<BasemapImage>,
    basemap_revision: u64,
    basemap_status: BasemapStatus,
    canvas: Option<(RenderKey, Pixmap)>,
    render_count: u64,
}

impl<P: AsyncProvider + 'static> Session<P> {
    /// Creates a session; pass `None` as `loader` to disable basemaps.
    pub fn new(renderer: Renderer, loader: Option<BasemapLoader<P>>) -> Self {
        let basemap_status = if loader.is_some() {
            BasemapStatus::Unsupported
        } else {
            BasemapStatus::Disabled
        };
        Self {
            document: None,
            generation: 0,
            style_revision: 0,
            view: MapViewController::new(),
            renderer,
            loader,
            basemap: None,
            basemap_revision: 0,
            basemap_status,
            canvas: None,
            render_count: 0,
        }
    }

    pub fn collection(&self) -> Option<&FeatureCollection> {
        self.document.as_ref().map(|d| &d.collection)
    }

    pub fn style(&self) -> Option<&StyleConfig> {
        self.document.as_ref().map(|d| &d.style)
    }

    pub fn table(&self) -> Option<&AttributeTableView> {
        self.document.as_ref().map(|d| &d.table)
    }

    pub fn path(&self) -> Option<&Path> {
        self.document.as_ref().map(|d| d.path.as_path())
    }

    pub fn view(&self) -> &MapViewController {
        &self.view
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn basemap_status(&self) -> &BasemapStatus {
        &self.basemap_status
    }

    pub fn basemap(&self) -> Option<&BasemapImage> {
        self.basemap.as_ref()
    }

    /// Whether there are edits not yet written with `Export`.
    pub fn is_modified(&self) -> bool {
        self.document
            .as_ref()
            .is_some_and(|d| d.collection.revision() != d.saved_revision)
    }

    /// Rows passing the current filter.
    pub fn rows(&self) -> Option<Rows<'_>> {
        self.document
            .as_ref()
            .map(|d| d.table.rows(&d.collection))
    }

    /// Number of canvases actually rasterised so far.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    fn document(&self) -> Result<&Document, ValidationError> {
        self.document.as_ref().ok_or(ValidationError::NoData)
    }

    fn document_mut(&mut self) -> Result<&mut Document, ValidationError> {
        self.document.as_mut().ok_or(ValidationError::NoData)
    }

    /// Applies an action.
    pub fn dispatch(&mut self, action: Action) -> Result<Outcome, ShapeditError> {
        debug!(?action, "Dispatching action");
        let outcome = match action {
            Action::Open(path) => self.open(&path)?,
            Action::Export(path) => {
                let doc = self.document_mut()?;
                let target = store::shp_path(&path);
                store::save(&target, &doc.collection)?;
                doc.saved_revision = doc.collection.revision();
                Outcome::Saved(target)
            }
            Action::ExportImage(path) => {
                let pixmap = self.render()?;
                save_png(pixmap, &path)?;
                Outcome::ImageSaved(path)
            }
            Action::EditCell { id, column, text } => {
                let doc = self.document_mut()?;
                doc.table.edit_cell(&mut doc.collection, id, &column, &text)?;
                Outcome::CellEdited { id, column }
            }
            Action::AddRow { template } => {
                let doc = self.document_mut()?;
                let template = match template {
                    Some(id) => id,
                    None => doc.collection.id_at(0).ok_or_else(|| {
                        ValidationError::Invalid("No existing row to copy a geometry from".into())
                    })?,
                };
                Outcome::RowAdded(doc.table.add_row(&mut doc.collection, template)?)
            }
            Action::DeleteRow(id) => {
                let doc = self.document_mut()?;
                doc.table.delete_row(&mut doc.collection, id)?;
                Outcome::RowDeleted(id)
            }
            Action::AddColumn {
                name,
                kind,
                default,
            } => {
                let doc = self.document_mut()?;
                doc.table
                    .add_column(&mut doc.collection, &name, kind, &default)?;
                Outcome::ColumnAdded(name)
            }
            Action::DeleteColumn(name) => {
                let doc = self.document_mut()?;
                doc.table.delete_column(&mut doc.collection, &name)?;
                let before = doc.style.clone();
                doc.style.reconcile(&doc.collection);
                if doc.style != before {
                    self.style_revision += 1;
                }
                Outcome::ColumnDeleted(name)
            }
            Action::MassUpdate {
                columns,
                operation,
                operand,
            } => {
                let doc = self.document_mut()?;
                let cells = doc
                    .table
                    .mass_update(&mut doc.collection, &columns, operation, operand)?;
                Outcome::MassUpdated { cells }
            }
            Action::SetFilter(text) => {
                let doc = self.document_mut()?;
                doc.table.set_filter(&doc.collection, &text);
                Outcome::FilterChanged {
                    visible: doc.table.rows(&doc.collection).count(),
                }
            }
            Action::ClearFilter => {
                let doc = self.document_mut()?;
                doc.table.clear_filter();
                Outcome::FilterChanged {
                    visible: doc.collection.len(),
                }
            }
            Action::SetColorColumn(column) => {
                let doc = self.document_mut()?;
                doc.style
                    .set_color_column(&doc.collection, column.as_deref())?;
                self.style_changed()
            }
            Action::SetColormap(colormap) => {
                self.document_mut()?.style.colormap = colormap;
                self.style_changed()
            }
            Action::SetTransparency(percent) => {
                self.document_mut()?.style.set_transparency(percent)?;
                self.style_changed()
            }
            Action::SetZoneStyle { zone, style } => {
                self.document_mut()?.style.set_zone_style(&zone, style)?;
                self.style_changed()
            }
            Action::Pan { dx, dy } => {
                self.document()?;
                self.view.pan(dx, dy)?;
                self.view_changed()
            }
            Action::Zoom(factor) => {
                self.document()?;
                self.view.zoom(factor)?;
                self.view_changed()
            }
            Action::SetZoomPercent(percent) => {
                self.document()?;
                self.view.set_zoom_percent(percent)?;
                self.view_changed()
            }
            Action::ResetView => {
                self.document()?;
                self.view.reset()?;
                self.view_changed()
            }
            Action::RefreshBasemap => {
                let crs = self.document()?.collection.crs().clone();
                if self.loader.is_none() {
                    return Err(NetworkError::Provider("Basemap is disabled".into()).into());
                }
                if !crs.supports_basemap() {
                    return Err(NetworkError::UnsupportedCrs(crs.to_string()).into());
                }
                self.request_basemap();
                Outcome::BasemapRequested
            }
            Action::ShowStatistics => Outcome::Statistics(self.document()?.collection.statistics()),
            Action::About => Outcome::About(about_text()),
        };
        Ok(outcome)
    }

    /// Applies an action and reports the result as a message; errors leave
    /// the session as it was before the action.
    pub fn handle(&mut self, action: Action) -> Notice {
        match self.dispatch(action) {
            Ok(outcome) => Notice::Info(outcome.to_string()),
            Err(e) => {
                warn!(error = %e, "Action failed");
                Notice::Error {
                    title: e.title(),
                    message: e.to_string(),
                }
            }
        }
    }

    fn open(&mut self, path: &Path) -> Result<Outcome, ShapeditError> {
        let collection = store::load(path)?;
        let features = collection.len();
        let path = store::shp_path(path);

        self.document = Some(Document {
            path: path.clone(),
            style: StyleConfig::for_collection(&collection),
            table: AttributeTableView::new(),
            saved_revision: collection.revision(),
            collection,
        });
        self.generation += 1;
        self.style_revision += 1;
        self.canvas = None;
        if self.basemap.take().is_some() {
            self.basemap_revision += 1;
        }

        let bounds = self.collection().and_then(display_bounds);
        match bounds {
            Some(bounds) => self.view.fit(bounds),
            None => self.view.fit(Bounds::empty()),
        }
        self.request_basemap();

        info!(path = %path.display(), features, "Document opened");
        Ok(Outcome::Loaded { path, features })
    }

    fn style_changed(&mut self) -> Outcome {
        self.style_revision += 1;
        Outcome::StyleChanged
    }

    fn view_changed(&mut self) -> Outcome {
        self.request_basemap();
        Outcome::ViewChanged
    }

    /// Asks the loader for imagery covering the current view.
    fn request_basemap(&mut self) {
        let supported = self
            .collection()
            .is_some_and(|c| c.crs().supports_basemap());
        let extent = self.view.extent();
        let revision = self.view.revision();
        let (width, height) = (self.renderer.width(), self.renderer.height());

        let Some(loader) = self.loader.as_mut() else {
            self.basemap_status = BasemapStatus::Disabled;
            return;
        };
        match extent {
            Some(extent) if supported => {
                let bounds = extent.bounds.fitted_to_aspect(width, height);
                loader.request(revision, bounds, width, height);
                self.basemap_status = BasemapStatus::Loading;
            }
            _ => {
                loader.cancel();
                self.basemap_status = BasemapStatus::Unsupported;
            }
        }
    }

    fn accept_basemap(&mut self, result: Result<BasemapImage, NetworkError>) -> Option<Notice> {
        match result {
            Ok(image) => {
                self.basemap = Some(image);
                self.basemap_revision += 1;
                self.basemap_status = BasemapStatus::Ready;
                None
            }
            Err(e) => {
                // Vectors keep drawing; only the imagery is missing.
                warn!(error = %e, "Basemap unavailable");
                self.basemap_status = BasemapStatus::Failed(e.clone());
                Some(Notice::Error {
                    title: ShapeditError::from(e.clone()).title(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Collects a finished basemap for the current view, if any.
    ///
    /// Returns a notice when the fetch failed.
    pub fn poll_basemap(&mut self) -> Option<Notice> {
        let revision = self.view.revision();
        let reply = self.loader.as_mut()?.poll(revision)?;
        self.accept_basemap(reply.result)
    }

    /// Waits for the basemap of the current view. Used by batch rendering.
    pub async fn wait_for_basemap(&mut self) -> Option<Notice> {
        if self.basemap_status != BasemapStatus::Loading {
            return None;
        }
        let revision = self.view.revision();
        let reply = self.loader.as_mut()?.wait(revision).await?;
        self.accept_basemap(reply.result)
    }

    fn render_key(&self) -> Option<RenderKey> {
        let doc = self.document.as_ref()?;
        Some(RenderKey {
            generation: self.generation,
            data: doc.collection.revision(),
            style: self.style_revision,
            view: self.view.revision(),
            basemap: self.basemap_revision,
        })
    }

    /// The canvas for the current state, re-rendered only if something
    /// changed since the last call.
    pub fn render(&mut self) -> Result<&Pixmap, ValidationError> {
        let key = self.render_key().ok_or(ValidationError::NoData)?;
        let stale = self.canvas.as_ref().map(|(k, _)| *k) != Some(key);
        if stale {
            let doc = self.document()?;
            let extent = self.view.extent().ok_or(ValidationError::NoData)?;
            let pixmap =
                self.renderer
                    .render(&doc.collection, &doc.style, &extent, self.basemap.as_ref());
            self.render_count += 1;
            self.canvas = Some((key, pixmap));
        }
        self.canvas
            .as_ref()
            .map(|(_, pixmap)| pixmap)
            .ok_or(ValidationError::NoData)
    }
}

fn about_text() -> String {
    format!(
        "shapedit {}\nView, edit and export shapefiles with satellite basemaps.",
        crate::VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basemap::tests::MockTileProvider;
    use crate::basemap::Basemap;
    use crate::cache::TileCache;
    use crate::store::{AttributeValue, Crs, FeatureId, MassOperation};
    use crate::style::Colormap;
    use std::sync::Arc;
    use tempfile::TempDir;

    const WGS84: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

    fn write_sample(dir: &TempDir, crs: Crs) -> PathBuf {
        let sample = store::sample_collection();
        let mut collection =
            FeatureCollection::new(sample.schema().clone(), sample.kind(), crs);
        for feature in sample.features() {
            collection.push_unchecked(feature.geometry.clone(), feature.values().to_vec());
        }
        let path = dir.path().join("fields.shp");
        store::save(&path, &collection).unwrap();
        path
    }

    fn offline_session() -> Session<MockTileProvider> {
        Session::new(Renderer::new(120, 80).unwrap(), None)
    }

    fn opened() -> (TempDir, Session<MockTileProvider>) {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, Crs::Unknown);
        let mut session = offline_session();
        session.dispatch(Action::Open(path)).unwrap();
        (dir, session)
    }

    fn loader(provider: MockTileProvider) -> BasemapLoader<MockTileProvider> {
        let basemap = Basemap::new(provider, Arc::new(TileCache::new(1024 * 1024)));
        BasemapLoader::new(basemap, tokio::runtime::Handle::current())
    }

    #[test]
    fn test_actions_without_document_fail_gracefully() {
        let mut session = offline_session();
        let notice = session.handle(Action::Zoom(2.0));
        assert_eq!(
            notice,
            Notice::Error {
                title: "Invalid edit",
                message: "No shapefile loaded".into()
            }
        );
        assert!(session.render().is_err());
    }

    #[test]
    fn test_open_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut session = offline_session();
        let notice = session.handle(Action::Open(dir.path().join("missing.shp")));
        match notice {
            Notice::Error { title, .. } => assert_eq!(title, "Open failed"),
            other => panic!("unexpected notice {:?}", other),
        }
        assert!(session.collection().is_none());
    }

    #[test]
    fn test_open_sets_style_and_view() {
        let (_dir, session) = opened();
        assert_eq!(session.collection().unwrap().len(), 3);
        assert_eq!(session.style().unwrap().color_column.as_deref(), Some("zone"));
        assert!(session.view().extent().is_some());
        assert_eq!(session.basemap_status(), &BasemapStatus::Disabled);
        assert!(!session.is_modified());
    }

    #[test]
    fn test_render_cached_until_something_changes() {
        let (_dir, mut session) = opened();
        let first = session.render().unwrap().clone();
        session.render().unwrap();
        assert_eq!(session.render_count(), 1);

        session
            .dispatch(Action::EditCell {
                id: FeatureId(0),
                column: "zone".into(),
                text: "2".into(),
            })
            .unwrap();
        let edited = session.render().unwrap().clone();
        assert_eq!(session.render_count(), 2);
        assert_ne!(first.data(), edited.data());

        session.dispatch(Action::SetColormap(Colormap::Reds)).unwrap();
        session.render().unwrap();
        assert_eq!(session.render_count(), 3);

        session.dispatch(Action::Pan { dx: 0.2, dy: 0.0 }).unwrap();
        session.render().unwrap();
        assert_eq!(session.render_count(), 4);
    }

    #[test]
    fn test_rejected_edit_changes_nothing() {
        let (_dir, mut session) = opened();
        session.render().unwrap();

        let notice = session.handle(Action::EditCell {
            id: FeatureId(1),
            column: "yield".into(),
            text: "lots".into(),
        });
        assert!(notice.is_error());
        assert_eq!(
            session
                .collection()
                .unwrap()
                .get_attribute(FeatureId(1), "yield")
                .unwrap(),
            &AttributeValue::Number(6.0)
        );
        session.render().unwrap();
        assert_eq!(session.render_count(), 1);
        assert!(!session.is_modified());
    }

    #[test]
    fn test_divide_by_zero_rejected() {
        let (_dir, mut session) = opened();
        let result = session.dispatch(Action::MassUpdate {
            columns: vec!["yield".into()],
            operation: MassOperation::Divide,
            operand: 0.0,
        });
        assert!(matches!(
            result,
            Err(ShapeditError::Validation(ValidationError::DivideByZero))
        ));
    }

    #[test]
    fn test_filter_and_rows() {
        let (_dir, mut session) = opened();
        let outcome = session.dispatch(Action::SetFilter("south".into())).unwrap();
        assert_eq!(outcome, Outcome::FilterChanged { visible: 1 });
        assert_eq!(session.rows().unwrap().count(), 1);

        session.dispatch(Action::ClearFilter).unwrap();
        assert_eq!(session.rows().unwrap().count(), 3);
    }

    #[test]
    fn test_delete_color_column_clears_style() {
        let (_dir, mut session) = opened();
        session.dispatch(Action::DeleteColumn("zone".into())).unwrap();
        assert!(session.style().unwrap().color_column.is_none());
        assert!(session.render().is_ok());
    }

    #[test]
    fn test_add_row_copies_first_geometry() {
        let (_dir, mut session) = opened();
        let outcome = session.dispatch(Action::AddRow { template: None }).unwrap();
        assert_eq!(outcome, Outcome::RowAdded(FeatureId(3)));
        assert!(session.is_modified());
    }

    #[test]
    fn test_export_round_trip_and_clears_modified() {
        let (dir, mut session) = opened();
        session.dispatch(Action::DeleteRow(FeatureId(0))).unwrap();
        assert!(session.is_modified());

        let target = dir.path().join("out").join("edited");
        let outcome = session.dispatch(Action::Export(target.clone())).unwrap();
        assert_eq!(outcome, Outcome::Saved(target.with_extension("shp")));
        assert!(!session.is_modified());

        let reloaded = store::load(&target.with_extension("shp")).unwrap();
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn test_export_image() {
        let (dir, mut session) = opened();
        let png = dir.path().join("map.png");
        session.dispatch(Action::ExportImage(png.clone())).unwrap();
        assert!(std::fs::metadata(&png).unwrap().len() > 0);
    }

    #[test]
    fn test_statistics_and_about() {
        let (_dir, mut session) = opened();
        match session.dispatch(Action::ShowStatistics).unwrap() {
            Outcome::Statistics(stats) => assert_eq!(stats.feature_count, 3),
            other => panic!("unexpected outcome {:?}", other),
        }
        let about = session.handle(Action::About);
        assert!(about.to_string().starts_with("shapedit "));
    }

    #[test]
    fn test_refresh_basemap_without_loader() {
        let (_dir, mut session) = opened();
        let result = session.dispatch(Action::RefreshBasemap);
        assert!(matches!(result, Err(ShapeditError::Network(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_basemap_failure_still_renders_vectors() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, Crs::from_wkt(WGS84));
        let mut session = Session::new(
            Renderer::new(120, 80).unwrap(),
            Some(loader(MockTileProvider::failing())),
        );
        session.dispatch(Action::Open(path)).unwrap();
        assert_eq!(session.basemap_status(), &BasemapStatus::Loading);

        let notice = session.wait_for_basemap().await.unwrap();
        assert_eq!(notice.to_string().split(':').next(), Some("Basemap unavailable"));
        assert!(matches!(session.basemap_status(), BasemapStatus::Failed(_)));
        assert!(session.basemap().is_none());
        assert!(session.render().is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_basemap_success_triggers_rerender() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, Crs::from_wkt(WGS84));
        let mut session = Session::new(
            Renderer::new(120, 80).unwrap(),
            Some(loader(MockTileProvider::serving([0, 90, 0]))),
        );
        session.dispatch(Action::Open(path)).unwrap();
        session.render().unwrap();

        assert!(session.wait_for_basemap().await.is_none());
        assert_eq!(session.basemap_status(), &BasemapStatus::Ready);
        session.render().unwrap();
        assert_eq!(session.render_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_projected_layer_gets_no_basemap() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir, Crs::from_wkt(r#"PROJCS["NAD83 / UTM zone 15N"]"#));
        let mut session = Session::new(
            Renderer::new(120, 80).unwrap(),
            Some(loader(MockTileProvider::serving([0, 90, 0]))),
        );
        session.dispatch(Action::Open(path)).unwrap();
        assert_eq!(session.basemap_status(), &BasemapStatus::Unsupported);
        assert!(matches!(
            session.dispatch(Action::RefreshBasemap),
            Err(ShapeditError::Network(NetworkError::UnsupportedCrs(_)))
        ));
    }
}
