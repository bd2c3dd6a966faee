//! Offline compilation of a source tree into an [`EmbeddedBundle`].
//!
//! The run is all-or-nothing: any decode failure, identifier collision or
//! cancellation aborts it and nothing is emitted.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sparkle_core::TaskPool;
use sparkle_core::alloc::HashMap;
use sparkle_core::profiling::{profile_function, profile_scope};
use walkdir::WalkDir;

use crate::bundle::{BundleBuilder, EmbeddedBundle, PAYLOAD_ALIGN};
use crate::decoder::{AssetDecoder, DecoderRegistry};
use crate::error::{CompileError, CompileResult};
use crate::id::{AssetId, identifier_for};
use crate::payload::NormalizedPayload;

/// Environment variable overriding [`CompilerConfig::worker_threads`].
pub const THREADS_ENV: &str = "SPARKLE_ASSET_THREADS";

/// Cooperative cancellation flag for a compile run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Decode workers. At least one is always used.
    pub worker_threads: usize,
    /// Compile files and directories whose names start with `.`.
    pub include_hidden: bool,
    /// Payload alignment inside the bundle.
    pub alignment: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            worker_threads: TaskPool::default_thread_count(),
            include_hidden: false,
            alignment: PAYLOAD_ALIGN,
        }
    }
}

impl CompilerConfig {
    /// Defaults, with `SPARKLE_ASSET_THREADS` applied when set to a positive number.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(THREADS_ENV) {
            match value.trim().parse::<usize>() {
                Ok(threads) if threads > 0 => config.worker_threads = threads,
                _ => tracing::warn!("Ignoring invalid {}={:?}", THREADS_ENV, value),
            }
        }
        config
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    pub fn with_hidden_files(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    pub fn with_alignment(mut self, alignment: usize) -> Self {
        self.alignment = alignment;
        self
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileStats {
    /// Files compiled into the bundle.
    pub assets: usize,
    /// Files with no registered decoder.
    pub skipped: usize,
    /// Sum of payload sizes, before deduplication.
    pub payload_bytes: u64,
    /// Assets whose payload duplicates an earlier one.
    pub duplicate_payloads: usize,
}

/// A source file selected for compilation.
#[derive(Debug, Clone)]
struct SourceAsset {
    path: PathBuf,
    identifier: String,
}

pub struct AssetCompiler {
    decoders: Arc<DecoderRegistry>,
    config: CompilerConfig,
    cancel: CancelToken,
}

impl Default for AssetCompiler {
    fn default() -> Self {
        Self::new(CompilerConfig::default())
    }
}

impl AssetCompiler {
    /// Compiler with the built-in decoders.
    pub fn new(config: CompilerConfig) -> Self {
        Self::with_decoders(DecoderRegistry::with_defaults(), config)
    }

    pub fn with_decoders(decoders: DecoderRegistry, config: CompilerConfig) -> Self {
        Self {
            decoders: Arc::new(decoders),
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Add a decoder, e.g. for fonts.
    ///
    /// Decode tasks still running from an earlier run keep the decoder set
    /// they started with.
    pub fn register_decoder<D: AssetDecoder>(&mut self, decoder: D) {
        Arc::make_mut(&mut self.decoders).register(decoder);
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Token that stops this compiler's runs, present and future.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn compile(&self, root: impl AsRef<Path>) -> CompileResult<EmbeddedBundle> {
        self.compile_with_stats(root).map(|(bundle, _)| bundle)
    }

    pub fn compile_with_stats(&self, root: impl AsRef<Path>) -> CompileResult<(EmbeddedBundle, CompileStats)> {
        profile_function!();
        let root = root.as_ref();
        tracing::info!("Compiling assets under {}", root.display());

        let mut stats = CompileStats::default();
        let sources = self.discover(root, &mut stats)?;
        check_identifiers(&sources)?;
        self.check_cancelled()?;

        let payloads = self.decode_all(&sources)?;

        let mut builder = BundleBuilder::with_alignment(self.config.alignment);
        for (source, payload) in sources.into_iter().zip(payloads) {
            stats.payload_bytes += payload.bytes.len() as u64;
            let hash = builder.push(source.identifier.clone(), payload);
            tracing::debug!("  {} -> {}", source.identifier, hash);
        }
        stats.assets = builder.len();
        stats.duplicate_payloads = builder.duplicate_payloads();

        self.check_cancelled()?;
        let bundle = {
            profile_scope!("finalize_bundle");
            builder.finish()?
        };

        tracing::info!(
            "Compiled {} assets ({} skipped, {} duplicate payloads, {} bytes)",
            stats.assets,
            stats.skipped,
            stats.duplicate_payloads,
            bundle.len()
        );
        Ok((bundle, stats))
    }

    /// Compile and atomically write the bundle to `dest`.
    pub fn compile_to_file(&self, root: impl AsRef<Path>, dest: impl AsRef<Path>) -> CompileResult<CompileStats> {
        let (bundle, stats) = self.compile_with_stats(root)?;
        let dest = dest.as_ref();
        bundle.write_to(dest).map_err(|source| CompileError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
        Ok(stats)
    }

    fn check_cancelled(&self) -> CompileResult<()> {
        if self.cancel.is_cancelled() {
            tracing::info!("Asset compilation cancelled");
            Err(CompileError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Collect recognized files, sorted by identifier.
    fn discover(&self, root: &Path, stats: &mut CompileStats) -> CompileResult<Vec<SourceAsset>> {
        profile_function!();
        let include_hidden = self.config.include_hidden;
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || include_hidden || !is_hidden(entry.file_name()));

        let mut sources = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| CompileError::Io {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
            if !self.decoders.handles(extension) {
                tracing::debug!("Skipping {} (no decoder)", path.display());
                stats.skipped += 1;
                continue;
            }

            let relative = path.strip_prefix(root).map_err(|_| CompileError::InvalidPath {
                path: path.to_path_buf(),
                reason: "outside the source root".to_string(),
            })?;
            sources.push(SourceAsset {
                path: path.to_path_buf(),
                identifier: identifier_for(relative)?,
            });
        }

        sources.sort_by(|a, b| a.identifier.cmp(&b.identifier).then_with(|| a.path.cmp(&b.path)));
        Ok(sources)
    }

    /// Decode every source on a worker pool. Results come back in input order;
    /// the first failure in that order wins.
    fn decode_all(&self, sources: &[SourceAsset]) -> CompileResult<Vec<NormalizedPayload>> {
        profile_function!();
        let pool = TaskPool::new(self.config.worker_threads.max(1));
        let result = self.decode_on(&pool, sources);
        pool.shutdown();
        result
    }

    fn decode_on(&self, pool: &TaskPool, sources: &[SourceAsset]) -> CompileResult<Vec<NormalizedPayload>> {
        let mut tasks = Vec::with_capacity(sources.len());
        for source in sources {
            // Dropping `tasks` on return cancels anything already queued.
            self.check_cancelled()?;
            let decoders = Arc::clone(&self.decoders);
            let cancel = self.cancel.clone();
            let path = source.path.clone();
            tasks.push(pool.spawn_blocking(move || decode_file(&decoders, &cancel, path)));
        }

        let mut payloads = Vec::with_capacity(tasks.len());
        for task in tasks {
            payloads.push(pollster::block_on(task)?);
        }
        self.check_cancelled()?;
        Ok(payloads)
    }
}

fn decode_file(decoders: &DecoderRegistry, cancel: &CancelToken, path: PathBuf) -> CompileResult<NormalizedPayload> {
    if cancel.is_cancelled() {
        return Err(CompileError::Cancelled);
    }
    let bytes = std::fs::read(&path).map_err(|source| CompileError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::debug!("Decoding {} ({} bytes)", path.display(), bytes.len());
    decoders
        .decode(&path, &bytes)
        .map_err(|cause| CompileError::Decode { path, cause })
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}

/// Identifiers must be unique, and so must their [`AssetId`]s.
fn check_identifiers(sources: &[SourceAsset]) -> CompileResult<()> {
    for pair in sources.windows(2) {
        if pair[0].identifier == pair[1].identifier {
            return Err(CompileError::DuplicateIdentifier {
                identifier: pair[1].identifier.clone(),
                first: pair[0].path.clone(),
                second: pair[1].path.clone(),
            });
        }
    }

    let mut ids: HashMap<AssetId, &SourceAsset> = HashMap::with_capacity(sources.len());
    for source in sources {
        if let Some(first) = ids.insert(AssetId::from_name(&source.identifier), source) {
            return Err(CompileError::DuplicateIdentifier {
                identifier: source.identifier.clone(),
                first: first.path.clone(),
                second: source.path.clone(),
            });
        }
    }
    Ok(())
}

/// Compile `root` with the default configuration.
pub fn compile(root: impl AsRef<Path>) -> CompileResult<EmbeddedBundle> {
    AssetCompiler::new(CompilerConfig::from_env()).compile(root)
}
