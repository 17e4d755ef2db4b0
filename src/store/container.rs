//! # Store Container
//!
//! A `FlatDb` owns exactly one record store per record type plus the shared
//! string pool. Creating a second store for a type it already owns is an
//! error; two independent buffers silently coexisting for one record type
//! is exactly the bug the container exists to rule out.
//!
//! ## Directory Layout
//!
//! ```text
//! saved_dir/
//! ├── Token.rec      # one file per record type: LE u32 word stream
//! ├── Item.rec
//! └── strings.dat    # flattened string pool (committed region)
//! ```
//!
//! `load_all` expects the same schema to be registered first; it refills the
//! registered stores from their files and reloads the pool.
//!
//! ## Range Finalization
//!
//! Range fields read the *next* record's reference as their exclusive end,
//! so a bulk build finishes by appending one sentinel record whose reference
//! fields point one past the end of each referenced store. That is
//! [`FlatDb::close_ranges`]. It is explicit, not automatic.

use std::any::TypeId;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use eyre::Result;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use tracing::debug;

use crate::config::{DEFAULT_STRING_POOL_CAPACITY, RECORD_FILE_EXTENSION, STRINGS_FILE_NAME};
use crate::error::StoreError;
use crate::fields::SentinelField;
use crate::handle::Ref;
use crate::layout::{FlatStruct, Layout};
use crate::store::FlatArray;
use crate::strings::{Distinct, StringPool, Strings};

/// Type-erased store surface: what the container needs without knowing the
/// record type.
trait AnyStore {
    fn type_name(&self) -> &'static str;
    fn word_len(&self) -> u32;
    fn save(&self, writer: &mut dyn Write) -> Result<()>;
    fn load(&mut self, reader: &mut dyn Read) -> Result<()>;
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

impl<S: FlatStruct> AnyStore for FlatArray<S> {
    fn type_name(&self) -> &'static str {
        S::NAME
    }

    fn word_len(&self) -> u32 {
        FlatArray::word_len(self)
    }

    fn save(&self, mut writer: &mut dyn Write) -> Result<()> {
        FlatArray::save(self, &mut writer)
    }

    fn load(&mut self, mut reader: &mut dyn Read) -> Result<()> {
        FlatArray::load(self, &mut reader)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Container owning one record store per record type and the shared string
/// pool.
pub struct FlatDb {
    stores: HashMap<TypeId, Box<dyn AnyStore>>,
    strings: Strings,
}

impl Default for FlatDb {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatDb {
    /// Container with the default configuration (deduplicating strings).
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> FlatDbBuilder {
        FlatDbBuilder::default()
    }

    /// Create and register the store for record type `S`. Fails with
    /// [`StoreError::DuplicateStoreRequest`] if this container already owns
    /// one.
    pub fn create_array<S: FlatStruct>(
        &mut self,
        layout: &Layout<S>,
    ) -> Result<&mut FlatArray<S>> {
        match self.stores.entry(TypeId::of::<S>()) {
            Entry::Occupied(_) => {
                Err(StoreError::DuplicateStoreRequest { type_name: S::NAME }.into())
            }
            Entry::Vacant(slot) => {
                let store = slot.insert(Box::new(FlatArray::new(layout)));
                downcast_mut(store.as_mut())
            }
        }
    }

    /// The store for record type `S`.
    pub fn array<S: FlatStruct>(&self) -> Result<&FlatArray<S>> {
        let store = self
            .stores
            .get(&TypeId::of::<S>())
            .ok_or(StoreError::UnknownReferencedStore { type_name: S::NAME })?;
        downcast(store.as_ref())
    }

    pub fn array_mut<S: FlatStruct>(&mut self) -> Result<&mut FlatArray<S>> {
        let store = self
            .stores
            .get_mut(&TypeId::of::<S>())
            .ok_or(StoreError::UnknownReferencedStore { type_name: S::NAME })?;
        downcast_mut(store.as_mut())
    }

    /// One-past-the-end handle of `R`'s store: the value a sentinel's
    /// reference field receives.
    pub fn end_of<R: FlatStruct>(&self) -> Result<Ref<R>> {
        Ok(self.array::<R>()?.end())
    }

    /// Finalize a bulk build of `S`: append the sentinel record and let every
    /// range-participating reference field write its end pointer. Returns the
    /// sentinel's handle.
    pub fn close_ranges<S: FlatStruct>(
        &mut self,
        fields: &[&dyn SentinelField<S>],
    ) -> Result<Ref<S>> {
        let sentinel = self.array_mut::<S>()?.push();
        for field in fields {
            field.close(sentinel, self)?;
        }
        Ok(sentinel)
    }

    pub fn strings(&self) -> &Strings {
        &self.strings
    }

    pub fn strings_mut(&mut self) -> &mut Strings {
        &mut self.strings
    }

    /// Persist every store and the string pool into `dir` (created if
    /// missing). See the module docs for the directory layout.
    pub fn save_all(&mut self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        for store in self.stores.values() {
            let path = dir.join(format!("{}.{RECORD_FILE_EXTENSION}", store.type_name()));
            let mut writer = BufWriter::new(File::create(&path)?);
            store.save(&mut writer)?;
            writer.flush()?;
            debug!(
                type_name = store.type_name(),
                words = store.word_len(),
                "saved record store"
            );
        }

        let mut writer = BufWriter::new(File::create(dir.join(STRINGS_FILE_NAME))?);
        self.strings.save_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Refill every registered store and the string pool from `dir`.
    pub fn load_all(&mut self, dir: &Path) -> Result<()> {
        for store in self.stores.values_mut() {
            let path = dir.join(format!("{}.{RECORD_FILE_EXTENSION}", store.type_name()));
            let mut reader = BufReader::new(File::open(&path)?);
            store.load(&mut reader)?;
            debug!(
                type_name = store.type_name(),
                words = store.word_len(),
                "loaded record store"
            );
        }

        let mut reader = BufReader::new(File::open(dir.join(STRINGS_FILE_NAME))?);
        self.strings.load_from(&mut reader)?;
        Ok(())
    }
}

fn downcast<S: FlatStruct>(store: &dyn AnyStore) -> Result<&FlatArray<S>> {
    store
        .as_any()
        .downcast_ref::<FlatArray<S>>()
        .ok_or_else(|| eyre::eyre!("store registered under the wrong type id"))
}

fn downcast_mut<S: FlatStruct>(store: &mut dyn AnyStore) -> Result<&mut FlatArray<S>> {
    store
        .as_any_mut()
        .downcast_mut::<FlatArray<S>>()
        .ok_or_else(|| eyre::eyre!("store registered under the wrong type id"))
}

/// Configuration for a [`FlatDb`].
pub struct FlatDbBuilder {
    distinct_strings: bool,
    string_capacity: u32,
}

impl Default for FlatDbBuilder {
    fn default() -> Self {
        Self {
            distinct_strings: true,
            string_capacity: DEFAULT_STRING_POOL_CAPACITY,
        }
    }
}

impl FlatDbBuilder {
    /// Use a raw pool: every `save` appends, equal content is not shared.
    pub fn raw_strings(mut self) -> Self {
        self.distinct_strings = false;
        self
    }

    /// Use a deduplicating pool (the default).
    pub fn distinct_strings(mut self) -> Self {
        self.distinct_strings = true;
        self
    }

    /// Initial byte capacity of the string pool.
    pub fn string_capacity(mut self, bytes: u32) -> Self {
        self.string_capacity = bytes;
        self
    }

    pub fn build(self) -> FlatDb {
        let pool = StringPool::with_capacity(self.string_capacity);
        let strings = if self.distinct_strings {
            Strings::Distinct(Distinct::new(pool))
        } else {
            Strings::Raw(pool)
        };
        FlatDb {
            stores: HashMap::new(),
            strings,
        }
    }
}
