//! The source manager.
//!
//! [`SourceManager`] keeps the table of installed source plugins and routes
//! every caller-facing operation to the right plugin. Results are normalized
//! through the [`IdentityStore`] before they are returned.
//!
//! Locks are only held for in-memory bookkeeping and local persistence, never
//! across a plugin or registry call.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info, warn};
use tsundoku_model::{
    Capability, Chapter, ChapterId, ChapterUpdate, Manga, MangaId, Source, SourceDescriptor,
};
use tsundoku_registry::RegistryClient;
use tsundoku_source::{
    ChapterOrder, Credentials, NativeChapter, NativeManga, PluginArtifact, PluginLoader,
    SearchFilter, SourceError, SourcePlugin,
};

use crate::installed::{artifact_key, load_records, save_records};
use crate::session::session_key;
use crate::store::{KeyValueStore, load_json, save_json};
use crate::sync::{lock, read, write};
use crate::{
    FavoritesStore, IdentityStore, InstallError, InstalledRecord, ManagerError, ManagerResult,
    Session, SessionStore, StoreResult,
};

/// Store key of the identity snapshot.
const IDENTITIES_KEY: &str = "identities";

/// An entry of the source table.
struct InstalledSource {
    record: InstalledRecord,
    plugin: Arc<dyn SourcePlugin>,
}

/// Aggregates installed source plugins behind one interface.
pub struct SourceManager {
    registry: Arc<dyn RegistryClient>,
    loader: Arc<dyn PluginLoader>,
    store: Arc<dyn KeyValueStore>,
    sources: RwLock<BTreeMap<String, InstalledSource>>,
    identities: IdentityStore,
    sessions: SessionStore,
    favorites: FavoritesStore,
    /// Serializes identity snapshot writes so an older snapshot never
    /// overwrites a newer one.
    identity_writes: Mutex<()>,
}

impl SourceManager {
    /// Creates a manager with no installed sources.
    ///
    /// Call [`Self::restore`] to reload persisted state.
    #[must_use]
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        loader: Arc<dyn PluginLoader>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            registry,
            loader,
            store,
            sources: RwLock::new(BTreeMap::new()),
            identities: IdentityStore::new(),
            sessions: SessionStore::new(),
            favorites: FavoritesStore::new(),
            identity_writes: Mutex::new(()),
        }
    }

    /// Reloads installed sources, identities, favorites and remembered
    /// sessions from the store. Returns the number of sources restored.
    ///
    /// A source whose artifact is missing or fails to load is skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted records, identities or favorites
    /// cannot be read or decoded.
    pub fn restore(&self) -> ManagerResult<usize> {
        let records = load_records(self.store.as_ref())?;
        let mut restored = BTreeMap::new();

        for (name, record) in records {
            match self.reload(&record) {
                Ok(plugin) => {
                    restored.insert(name, InstalledSource { record, plugin });
                }
                Err(e) => warn!(source = %name, error = %e, "skipping installed source"),
            }
        }

        if let Some(bytes) = self.store.get(IDENTITIES_KEY)? {
            self.identities.restore(&bytes)?;
        }
        let favorites = self.favorites.restore(self.store.as_ref())?;

        for (name, installed) in &restored {
            if installed.record.descriptor.capabilities.contains(Capability::Login) {
                self.restore_session(name, installed.plugin.as_ref());
            }
        }

        let count = restored.len();
        *write(&self.sources) = restored;
        info!(sources = count, favorites, "restored manager state");
        Ok(count)
    }

    fn reload(&self, record: &InstalledRecord) -> ManagerResult<Arc<dyn SourcePlugin>> {
        let name = &record.descriptor.name;
        let bytes = self.store.get(&artifact_key(name))?.ok_or_else(|| {
            ManagerError::install_failed(
                name,
                InstallError::Validation("artifact missing from store".to_string()),
            )
        })?;

        let artifact = PluginArtifact::new(name, record.descriptor.version.clone(), bytes);
        let plugin = self
            .loader
            .load(&artifact)
            .map_err(|e| ManagerError::install_failed(name, InstallError::Load(e)))?;
        validate(&record.descriptor, plugin.as_ref())
            .map_err(|cause| ManagerError::install_failed(name, cause))?;
        Ok(plugin)
    }

    fn restore_session(&self, name: &str, plugin: &dyn SourcePlugin) {
        let session: Session = match load_json(self.store.as_ref(), &session_key(name)) {
            Ok(Some(session)) => session,
            Ok(None) => return,
            Err(e) => {
                warn!(source = %name, error = %e, "skipping unreadable session");
                return;
            }
        };

        if session.is_expired_at(chrono::Utc::now()) {
            debug!(source = %name, "remembered session expired");
            return;
        }

        if let Some(login) = plugin.as_login() {
            login.restore_session(&session.to_token());
        }
        self.sessions.set(session);
        debug!(source = %name, "restored remembered session");
    }

    /// Lists the registry catalog, marking installed sources.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::RemoteUnavailable`] if the catalog cannot be fetched.
    pub async fn list_remote_sources(&self) -> ManagerResult<Vec<Source>> {
        let catalog = self
            .registry
            .fetch_catalog()
            .await
            .map_err(ManagerError::RemoteUnavailable)?;

        let installed = self.installed_versions();
        Ok(catalog
            .iter()
            .map(|d| Source::from_catalog(d).with_installed_version(installed.get(&d.name)))
            .collect())
    }

    fn installed_versions(&self) -> BTreeMap<String, semver::Version> {
        read(&self.sources)
            .iter()
            .map(|(name, s)| (name.clone(), s.record.descriptor.version.clone()))
            .collect()
    }

    /// Installs a source from the registry.
    ///
    /// Installing an already-installed source returns the existing entry
    /// without contacting the registry. Otherwise nothing is registered unless
    /// every step succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::RemoteUnavailable`] if the catalog cannot be
    /// fetched, [`ManagerError::SourceNotFound`] if the source is not listed,
    /// and [`ManagerError::InstallFailed`] if the artifact cannot be
    /// retrieved, loaded, validated or persisted.
    pub async fn install_source(&self, name: &str) -> ManagerResult<Source> {
        if let Some(source) = self.get(name) {
            debug!(source = %name, "source already installed");
            return Ok(source);
        }

        let catalog = self
            .registry
            .fetch_catalog()
            .await
            .map_err(ManagerError::RemoteUnavailable)?;
        let descriptor = catalog
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| ManagerError::SourceNotFound {
                name: name.to_string(),
            })?;

        info!(source = %name, version = %descriptor.version, "installing source");
        let artifact = self
            .registry
            .fetch_artifact(name)
            .await
            .map_err(|e| ManagerError::install_failed(name, InstallError::Retrieval(e)))?;

        let plugin = self
            .loader
            .load(&artifact)
            .map_err(|e| ManagerError::install_failed(name, InstallError::Load(e)))?;
        validate(&descriptor, plugin.as_ref())
            .map_err(|cause| ManagerError::install_failed(name, cause))?;

        self.commit_install(descriptor, &artifact, plugin)
    }

    /// Registers a loaded plugin and persists it, all under the exclusive
    /// section of the source table.
    fn commit_install(
        &self,
        descriptor: SourceDescriptor,
        artifact: &PluginArtifact,
        plugin: Arc<dyn SourcePlugin>,
    ) -> ManagerResult<Source> {
        let name = descriptor.name.clone();
        let mut sources = write(&self.sources);

        // A concurrent install of the same source won.
        if let Some(existing) = sources.get(&name) {
            return Ok(Source::installed(&existing.record.descriptor));
        }

        let record = InstalledRecord::new(descriptor);
        let mut records: BTreeMap<_, _> = sources
            .iter()
            .map(|(n, s)| (n.clone(), s.record.clone()))
            .collect();
        records.insert(name.clone(), record.clone());

        let persisted = self
            .store
            .put(&artifact_key(&name), &artifact.bytes)
            .and_then(|()| save_records(self.store.as_ref(), &records));
        if let Err(e) = persisted {
            if let Err(cleanup) = self.store.delete(&artifact_key(&name)) {
                warn!(source = %name, error = %cleanup, "failed to remove stored artifact");
            }
            return Err(ManagerError::install_failed(&name, InstallError::Storage(e)));
        }

        let source = Source::installed(&record.descriptor);
        sources.insert(name.clone(), InstalledSource { record, plugin });
        info!(source = %name, "source installed");
        Ok(source)
    }

    /// Uninstalls a source and forgets its session.
    ///
    /// Identities of its manga are kept; operations on them later report
    /// [`ManagerError::NotInstalled`].
    ///
    /// Once the updated records are persisted the uninstall has happened;
    /// leftover artifact or session files are only logged.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::NotInstalled`] if the source is not installed,
    /// or a storage error if the updated records cannot be persisted.
    pub fn uninstall_source(&self, name: &str) -> ManagerResult<()> {
        {
            let mut sources = write(&self.sources);
            if !sources.contains_key(name) {
                return Err(ManagerError::NotInstalled {
                    name: name.to_string(),
                });
            }

            let records: BTreeMap<_, _> = sources
                .iter()
                .filter(|(n, _)| n.as_str() != name)
                .map(|(n, s)| (n.clone(), s.record.clone()))
                .collect();
            save_records(self.store.as_ref(), &records)?;
            sources.remove(name);
        }

        if let Err(e) = self.store.delete(&artifact_key(name)) {
            warn!(source = %name, error = %e, "failed to remove stored artifact");
        }
        self.sessions.remove(name);
        if let Err(e) = self.store.delete(&session_key(name)) {
            warn!(source = %name, error = %e, "failed to remove stored session");
        }

        info!(source = %name, "source uninstalled");
        Ok(())
    }

    /// Lists installed sources, sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<Source> {
        read(&self.sources)
            .values()
            .map(|s| Source::installed(&s.record.descriptor))
            .collect()
    }

    /// Returns an installed source.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Source> {
        read(&self.sources)
            .get(name)
            .map(|s| Source::installed(&s.record.descriptor))
    }

    /// Resolves the plugin of an installed source.
    fn plugin(&self, name: &str) -> ManagerResult<Arc<dyn SourcePlugin>> {
        read(&self.sources)
            .get(name)
            .map(|s| Arc::clone(&s.plugin))
            .ok_or_else(|| ManagerError::NotInstalled {
                name: name.to_string(),
            })
    }

    /// Resolves the plugin of an installed source whose recorded capability
    /// set includes `capability`. The plugin may implement more than it was
    /// installed with; those extras are never dispatched to.
    fn capable_plugin(
        &self,
        name: &str,
        capability: Capability,
    ) -> ManagerResult<Arc<dyn SourcePlugin>> {
        let sources = read(&self.sources);
        let installed = sources.get(name).ok_or_else(|| ManagerError::NotInstalled {
            name: name.to_string(),
        })?;
        if !installed.record.descriptor.capabilities.contains(capability) {
            return Err(ManagerError::unsupported(name, capability));
        }
        Ok(Arc::clone(&installed.plugin))
    }

    /// Fetches a page of recently updated manga. Pages start at 1.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::InvalidArgument`] if `page` is not positive,
    /// [`ManagerError::NotInstalled`], [`ManagerError::UnsupportedCapability`],
    /// or [`ManagerError::Upstream`] if the source fails.
    pub async fn get_latest_updates(&self, name: &str, page: i64) -> ManagerResult<Vec<Manga>> {
        if page <= 0 {
            return Err(ManagerError::InvalidArgument(format!(
                "page must be 1 or greater, got {page}"
            )));
        }
        let page = u32::try_from(page)
            .map_err(|_| ManagerError::InvalidArgument(format!("page out of range: {page}")))?;

        let plugin = self.capable_plugin(name, Capability::LatestUpdates)?;
        let latest = plugin
            .as_latest_updates()
            .ok_or_else(|| ManagerError::unsupported(name, Capability::LatestUpdates))?;

        debug!(source = %name, page, "fetching latest updates");
        let natives = latest
            .latest_updates(page)
            .await
            .map_err(|e| ManagerError::upstream(name, e))?;

        Ok(self.normalize_list(name, natives))
    }

    /// Searches a source. The filter is passed through unvalidated.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::NotInstalled`],
    /// [`ManagerError::UnsupportedCapability`], or [`ManagerError::Upstream`]
    /// if the source fails.
    pub async fn search_manga(
        &self,
        name: &str,
        filter: &SearchFilter,
    ) -> ManagerResult<Vec<Manga>> {
        let plugin = self.capable_plugin(name, Capability::Search)?;
        let search = plugin
            .as_search()
            .ok_or_else(|| ManagerError::unsupported(name, Capability::Search))?;

        debug!(source = %name, ?filter, "searching");
        let natives = search
            .search(filter)
            .await
            .map_err(|e| ManagerError::upstream(name, e))?;

        Ok(self.normalize_list(name, natives))
    }

    fn normalize_list(&self, name: &str, natives: Vec<NativeManga>) -> Vec<Manga> {
        let mut manga = self.identities.normalize_manga_list(name, natives);
        for m in &mut manga {
            m.is_favorite = self.favorites.contains(m.id);
        }
        self.persist_identities();
        manga
    }

    /// Re-fetches the details of a known manga from its source.
    ///
    /// With `include_chapters`, the chapter list is populated from the cache,
    /// or fetched and normalized when none is cached.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::MangaNotFound`] for an unknown ID,
    /// [`ManagerError::NotInstalled`] if the owning source was uninstalled,
    /// or [`ManagerError::Upstream`] if the source fails.
    pub async fn get_manga_details(
        &self,
        id: MangaId,
        include_chapters: bool,
    ) -> ManagerResult<Manga> {
        let (name, native_id) = self
            .identities
            .owner(id)
            .ok_or(ManagerError::MangaNotFound { id })?;
        let plugin = self.plugin(&name)?;

        debug!(source = %name, manga_id = id, "fetching manga details");
        let native = plugin
            .fetch_details(&native_id)
            .await
            .map_err(|e| ManagerError::upstream(&name, e))?;
        let mut manga = self
            .identities
            .refresh_manga(id, native)
            .ok_or(ManagerError::MangaNotFound { id })?;

        if include_chapters {
            let chapters = match self.identities.cached_chapters(id) {
                Some(chapters) => chapters,
                None => self.fetch_chapters(id, &name, &native_id, plugin.as_ref()).await?,
            };
            manga.chapters = Some(chapters);
        }

        manga.is_favorite = self.favorites.contains(id);
        self.persist_identities();
        Ok(manga)
    }

    /// Fetches the chapter list of a manga, in the reading order its source
    /// declares.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::MangaNotFound`] for an unknown ID,
    /// [`ManagerError::NotInstalled`] if the owning source was uninstalled,
    /// or [`ManagerError::Upstream`] if the source fails.
    pub async fn get_chapters(&self, manga_id: MangaId) -> ManagerResult<Vec<Chapter>> {
        let (name, native_id) = self
            .identities
            .owner(manga_id)
            .ok_or(ManagerError::MangaNotFound { id: manga_id })?;
        let plugin = self.plugin(&name)?;

        let chapters = self
            .fetch_chapters(manga_id, &name, &native_id, plugin.as_ref())
            .await?;
        self.persist_identities();
        Ok(chapters)
    }

    async fn fetch_chapters(
        &self,
        manga_id: MangaId,
        name: &str,
        native_id: &str,
        plugin: &dyn SourcePlugin,
    ) -> ManagerResult<Vec<Chapter>> {
        debug!(source = %name, manga_id, "fetching chapters");
        let mut natives = plugin
            .fetch_chapters(native_id)
            .await
            .map_err(|e| ManagerError::upstream(name, e))?;
        order_chapters(&mut natives, plugin.chapter_order());

        self.identities
            .normalize_chapters(manga_id, natives)
            .ok_or(ManagerError::MangaNotFound { id: manga_id })
    }

    /// Returns a known chapter.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::ChapterNotFound`] for an unknown ID.
    pub fn get_chapter(&self, id: ChapterId) -> ManagerResult<Chapter> {
        self.identities
            .chapter(id)
            .ok_or(ManagerError::ChapterNotFound { id })
    }

    /// Logs in to a source and stores the session, overwriting any prior one.
    ///
    /// A remembered session is persisted and restored on the next start; a
    /// session that is not remembered also removes any persisted one.
    /// An empty `two_factor` code counts as none.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::NotInstalled`],
    /// [`ManagerError::UnsupportedCapability`], [`ManagerError::AuthFailed`],
    /// [`ManagerError::TwoFactorRequired`], [`ManagerError::TwoFactorInvalid`],
    /// [`ManagerError::Upstream`] for other source failures, or a storage
    /// error if the session cannot be persisted.
    pub async fn login(
        &self,
        name: &str,
        username: &str,
        password: &str,
        two_factor: Option<&str>,
        remember: bool,
    ) -> ManagerResult<Session> {
        let plugin = self.capable_plugin(name, Capability::Login)?;
        let login = plugin
            .as_login()
            .ok_or_else(|| ManagerError::unsupported(name, Capability::Login))?;

        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
            two_factor: two_factor.filter(|code| !code.is_empty()).map(str::to_string),
        };

        debug!(source = %name, username, "logging in");
        let token = login
            .login(&credentials)
            .await
            .map_err(|e| login_error(name, e))?;

        let session = Session::new(name, token, remember);
        if remember {
            save_json(self.store.as_ref(), &session_key(name), &session)?;
        } else {
            self.store.delete(&session_key(name))?;
        }
        self.sessions.set(session.clone());

        info!(source = %name, remember, "logged in");
        Ok(session)
    }

    /// Returns the live session of a source.
    #[must_use]
    pub fn session(&self, name: &str) -> Option<Session> {
        self.sessions.get(name)
    }

    /// Marks a manga as favorite. Saving a favorite twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::MangaNotFound`] for an unknown ID, or a storage
    /// error if the favorites cannot be persisted.
    pub fn save_favorite(&self, manga_id: MangaId) -> ManagerResult<()> {
        if !self.identities.contains_manga(manga_id) {
            return Err(ManagerError::MangaNotFound { id: manga_id });
        }

        if self.favorites.insert(self.store.as_ref(), manga_id)? {
            info!(manga_id, "saved favorite");
        }
        Ok(())
    }

    /// Removes a manga from the favorites. Removing a manga that is not a
    /// favorite is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::MangaNotFound`] for an unknown ID, or a storage
    /// error if the favorites cannot be persisted.
    pub fn delete_favorite(&self, manga_id: MangaId) -> ManagerResult<()> {
        if !self.identities.contains_manga(manga_id) {
            return Err(ManagerError::MangaNotFound { id: manga_id });
        }

        if self.favorites.remove(self.store.as_ref(), manga_id)? {
            info!(manga_id, "deleted favorite");
        }
        Ok(())
    }

    /// Lists favorite manga in ID order, from cached identities.
    #[must_use]
    pub fn list_favorites(&self) -> Vec<Manga> {
        self.favorites
            .list()
            .into_iter()
            .filter_map(|id| self.identities.manga(id))
            .map(|mut manga| {
                manga.is_favorite = true;
                manga
            })
            .collect()
    }

    /// Lists the cached chapters of favorite manga, newest release first.
    ///
    /// Only chapter lists fetched earlier are included; nothing is fetched
    /// from the sources. Undated chapters come last, and ties are broken by
    /// the most recently allocated chapter. `limit` caps the number of entries.
    #[must_use]
    pub fn recent_updates(&self, limit: Option<usize>) -> Vec<ChapterUpdate> {
        let mut updates: Vec<ChapterUpdate> = self
            .favorites
            .list()
            .into_iter()
            .filter_map(|id| {
                let manga = self.identities.manga(id)?;
                let chapters = self.identities.cached_chapters(id)?;
                Some((manga, chapters))
            })
            .flat_map(|(manga, chapters)| {
                chapters.into_iter().map(move |chapter| ChapterUpdate {
                    manga_id: manga.id,
                    manga_title: manga.title.clone(),
                    chapter,
                })
            })
            .collect();

        updates.sort_by(|a, b| {
            let (a, b) = (&a.chapter, &b.chapter);
            match (a.released_at, b.released_at) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
            .then_with(|| b.id.cmp(&a.id))
        });
        if let Some(limit) = limit {
            updates.truncate(limit);
        }
        updates
    }

    /// Persists the identity snapshot if it changed.
    ///
    /// A failure is logged; identities stay valid in memory and are written
    /// again on the next change.
    fn persist_identities(&self) {
        if let Err(e) = self.write_identities() {
            warn!(error = %e, "failed to persist identities");
        }
    }

    fn write_identities(&self) -> StoreResult<()> {
        let _guard = lock(&self.identity_writes);
        if !self.identities.is_dirty() {
            return Ok(());
        }

        let (bytes, generation) = self.identities.snapshot()?;
        self.store.put(IDENTITIES_KEY, &bytes)?;
        self.identities.mark_persisted(generation);
        Ok(())
    }
}

/// Checks a loaded plugin against its catalog entry.
fn validate(descriptor: &SourceDescriptor, plugin: &dyn SourcePlugin) -> Result<(), InstallError> {
    if plugin.name() != descriptor.name {
        return Err(InstallError::Validation(format!(
            "plugin reports name {}, expected {}",
            plugin.name(),
            descriptor.name
        )));
    }

    let missing = plugin.capabilities().missing_from(&descriptor.capabilities);
    if !missing.is_empty() {
        let missing: Vec<_> = missing.iter().map(Capability::as_str).collect();
        return Err(InstallError::Validation(format!(
            "plugin lacks declared capabilities: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

fn login_error(name: &str, error: SourceError) -> ManagerError {
    let name = name.to_string();
    match error {
        SourceError::AuthFailed(reason) => ManagerError::AuthFailed { name, reason },
        SourceError::TwoFactorRequired => ManagerError::TwoFactorRequired { name },
        SourceError::TwoFactorInvalid => ManagerError::TwoFactorInvalid { name },
        cause => ManagerError::Upstream { name, cause },
    }
}

/// Sorts chapters into reading order. Numbered chapters come first; the sort
/// is stable, so unnumbered chapters keep their relative provider order.
fn order_chapters(chapters: &mut [NativeChapter], order: ChapterOrder) {
    let descending = match order {
        ChapterOrder::Provider => return,
        ChapterOrder::Ascending => false,
        ChapterOrder::Descending => true,
    };

    chapters.sort_by(|a, b| match (a.number, b.number) {
        (Some(x), Some(y)) if descending => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
