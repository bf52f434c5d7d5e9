use crate::error::StorageError;
use crate::store::PersistentStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::fs;
use std::fs::File;
use std::hash::Hash;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Secondary tier that keeps every demoted entry in its own file under `cache_directory`.
///
/// Each file holds a serialized [`Record`] so the key travels with the value; that is what lets
/// [`DiscreteFileStore::open`] rebuild the in-memory index from an existing directory. File names
/// are random and carry no meaning.
pub struct DiscreteFileStore<Key, Value, Format = JsonFormat> {
    cache_directory: PathBuf,
    index: HashMap<Key, PathBuf>,
    phantom: PhantomData<fn() -> (Value, Format)>,
}

impl<Key, Value, Format> DiscreteFileStore<Key, Value, Format>
where
    Key: Clone + Eq + Hash + Debug + Serialize + DeserializeOwned,
    Value: Serialize + DeserializeOwned,
    Format: FileFormat,
{
    /// Volatile store: anything already in `cache_directory` is discarded.
    pub fn new(cache_directory: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let cache_directory = cache_directory.into();
        remove_directory(&cache_directory)?;
        fs::create_dir_all(&cache_directory)?;

        Ok(Self {
            cache_directory,
            index: HashMap::new(),
            phantom: PhantomData,
        })
    }

    /// Non-volatile store: records left in `cache_directory` by a previous store are picked up
    /// again. Files that cannot be decoded are skipped and left in place; leftover partial writes
    /// and second records for an already indexed key are deleted.
    ///
    /// Before using, consider whether you really need demoted entries to survive a restart. A
    /// format change between versions of your value type turns every old record into garbage.
    pub fn open(cache_directory: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let mut store = Self {
            cache_directory: cache_directory.into(),
            index: HashMap::new(),
            phantom: PhantomData,
        };
        store.rehydrate_index()?;

        Ok(store)
    }

    fn rehydrate_index(&mut self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.cache_directory)?;

        for entry in fs::read_dir(&self.cache_directory)?.flatten() {
            let path = entry.path();
            if is_partial_write(&path) {
                debug!(?path, "removing leftover partial write");
                remove_file_logged(&path);
                continue;
            }

            match read_record::<Format, Record<Key, Value>>(&path) {
                Ok(record) => {
                    if let Some(kept) = self.index.get(&record.key) {
                        debug!(?kept, duplicate = ?path, "second record for key, removing duplicate");
                        remove_file_logged(&path);
                    } else {
                        self.index.insert(record.key, path);
                    }
                }
                Err(err) => warn!(?path, %err, "skipping unreadable record"),
            }
        }

        Ok(())
    }

    pub fn directory(&self) -> &Path {
        &self.cache_directory
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    fn path_for(&self, key: &Key) -> (PathBuf, bool) {
        match self.index.get(key) {
            Some(path) => (path.clone(), false),
            None => {
                let mut path = self.cache_directory.clone();
                path.push(Uuid::new_v4().hyphenated().to_string());
                (path, true)
            }
        }
    }
}

impl<Key, Value, Format> PersistentStore<Key, Value> for DiscreteFileStore<Key, Value, Format>
where
    Key: Clone + Eq + Hash + Debug + Send + Serialize + DeserializeOwned,
    Value: Serialize + DeserializeOwned,
    Format: FileFormat,
{
    fn put(&mut self, key: &Key, value: Value) -> Result<(), StorageError> {
        let (path, is_new) = self.path_for(key);
        write_record::<Format, _>(&path, &RecordRef { key, value: &value })?;

        if is_new {
            self.index.insert(key.clone(), path);
        }

        Ok(())
    }

    fn remove(&mut self, key: &Key) -> Option<Value> {
        let path = self.index.remove(key)?;
        let record = read_record::<Format, Record<Key, Value>>(&path);

        if let Err(err) = fs::remove_file(&path) {
            warn!(?key, ?path, %err, "failed to delete record file");
        }

        match record {
            Ok(record) => Some(record.value),
            Err(err) => {
                warn!(?key, ?path, %err, "record unreadable, treating as absent");
                None
            }
        }
    }

    fn clear(&mut self) {
        self.index.clear();

        let result = remove_directory(&self.cache_directory)
            .and_then(|_| fs::create_dir_all(&self.cache_directory).map_err(StorageError::from));
        if let Err(err) = result {
            warn!(directory = ?self.cache_directory, %err, "failed to reset store directory");
        }
    }
}

fn read_record<Format, T>(path: &Path) -> Result<T, StorageError>
where
    Format: FileFormat,
    T: DeserializeOwned,
{
    let file = File::open(path)?;
    Format::deserialize(BufReader::new(file))
}

const PARTIAL_WRITE_EXTENSION: &str = "tmp";

fn is_partial_write(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == PARTIAL_WRITE_EXTENSION)
}

/// Writes into a sibling temp file and renames it over `path`, so a failed write leaves neither a
/// stray file nor a truncated previous record behind.
fn write_record<Format, T>(path: &Path, value: &T) -> Result<(), StorageError>
where
    Format: FileFormat,
    T: Serialize,
{
    let partial = path.with_extension(PARTIAL_WRITE_EXTENSION);

    let result = File::create(&partial)
        .map_err(StorageError::from)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            Format::serialize(&mut writer, value)?;
            writer.flush()?;
            Ok(())
        })
        .and_then(|_| fs::rename(&partial, path).map_err(StorageError::from));

    if result.is_err() && partial.exists() {
        remove_file_logged(&partial);
    }

    result
}

fn remove_file_logged(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        warn!(?path, %err, "failed to delete file");
    }
}

fn remove_directory(directory: &Path) -> Result<(), StorageError> {
    match fs::remove_dir_all(directory) {
        Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
        _ => Ok(()),
    }
}

#[derive(Deserialize)]
struct Record<Key, Value> {
    key: Key,
    value: Value,
}

// Serializes identically to `Record`, without cloning the pair on the write path.
#[derive(Serialize)]
struct RecordRef<'a, Key, Value> {
    key: &'a Key,
    value: &'a Value,
}

/// Abstracts away the on-disk encoding of a record.
///
/// Buffered I/O is used because if you are writing to disk either you are working with large
/// data, or everything is small and the extra copy doesn't matter next to the syscalls.
pub trait FileFormat {
    fn serialize<T: Serialize>(writer: impl Write, value: &T) -> Result<(), StorageError>;

    fn deserialize<T: DeserializeOwned>(reader: impl Read) -> Result<T, StorageError>;
}

pub struct JsonFormat;

impl FileFormat for JsonFormat {
    fn serialize<T: Serialize>(writer: impl Write, value: &T) -> Result<(), StorageError> {
        Ok(serde_json::to_writer(writer, value)?)
    }

    fn deserialize<T: DeserializeOwned>(reader: impl Read) -> Result<T, StorageError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

pub struct BincodeFormat;

impl FileFormat for BincodeFormat {
    fn serialize<T: Serialize>(writer: impl Write, value: &T) -> Result<(), StorageError> {
        Ok(bincode::serialize_into(writer, value)?)
    }

    fn deserialize<T: DeserializeOwned>(reader: impl Read) -> Result<T, StorageError> {
        Ok(bincode::deserialize_from(reader)?)
    }
}

pub type JsonFileStore<Key, Value> = DiscreteFileStore<Key, Value, JsonFormat>;
pub type BincodeFileStore<Key, Value> = DiscreteFileStore<Key, Value, BincodeFormat>;
