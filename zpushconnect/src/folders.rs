//! Shared folders: folders another user makes available, and the list of
//! shares synchronised to this device.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use zpushsoap::{
    RecordReader, SoapDeserialize, SoapField, SoapParameters, SoapRequest, SoapSerialize,
    SoapShape, SoapValue,
};

use crate::error::{ConnectError, Result};

macro_rules! folder_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Eq)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// `"0"` stands for no folder.
            pub fn is_none(&self) -> bool {
                self.0 == "0"
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0.eq_ignore_ascii_case(&other.0)
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.to_ascii_lowercase().hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl SoapSerialize for $name {
            fn to_soap(&self) -> SoapValue {
                SoapValue::String(self.0.clone())
            }
        }

        impl SoapDeserialize for $name {
            fn shape() -> SoapShape {
                SoapShape::String
            }

            fn from_soap(value: SoapValue) -> zpushsoap::Result<Self> {
                String::from_soap(value).map($name::new)
            }
        }
    };
}

folder_id!(
    /// Folder id as seen by the device.
    SyncId
);

folder_id!(
    /// Folder id in the server backend.
    BackendId
);

/// Origin of a folder, from the first character of its [`SyncId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    Normal,
    Shared,
    Configured,
    Gab,
}

impl SyncId {
    pub fn new(id: impl Into<String>) -> Self {
        SyncId(id.into())
    }

    pub fn none() -> Self {
        SyncId::new("0")
    }

    pub fn kind(&self) -> SyncKind {
        match self.0.chars().next() {
            Some('S') => SyncKind::Shared,
            Some('C') => SyncKind::Configured,
            Some('G') => SyncKind::Gab,
            _ => SyncKind::Normal,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.kind() != SyncKind::Normal
    }
}

impl BackendId {
    /// Backend ids look like `{id}num`; the trailing number is dropped.
    pub fn new(id: impl Into<String>) -> Self {
        let mut id = id.into();
        if let Some(end) = id.find('}') {
            id.truncate(end + 1);
        }
        BackendId(id)
    }

    pub fn none() -> Self {
        BackendId::new("0")
    }
}

/// Flags of a share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ShareFlags(u32);

impl ShareFlags {
    pub const NONE: ShareFlags = ShareFlags(0);
    pub const SEND_AS_OWNER: ShareFlags = ShareFlags(1);
    pub const TRACK_SHARE_NAME: ShareFlags = ShareFlags(2);
    /// Flags that change the share on the server side.
    pub const APPLY_MASK: ShareFlags = ShareFlags(1);

    pub fn from_bits(bits: u32) -> Self {
        ShareFlags(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: ShareFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: ShareFlags, enabled: bool) -> Self {
        if enabled {
            ShareFlags(self.0 | other.0)
        } else {
            ShareFlags(self.0 & !other.0)
        }
    }

    fn masked(self, mask: ShareFlags) -> Self {
        ShareFlags(self.0 & mask.0)
    }
}

impl SoapSerialize for ShareFlags {
    fn to_soap(&self) -> SoapValue {
        SoapValue::Int(self.0.into())
    }
}

impl SoapDeserialize for ShareFlags {
    fn shape() -> SoapShape {
        SoapShape::Int
    }

    fn from_soap(value: SoapValue) -> zpushsoap::Result<Self> {
        let bits = i64::from_soap(value)?;
        u32::try_from(bits)
            .map(ShareFlags)
            .map_err(|_| zpushsoap::SoapError::InvalidValue {
                kind: "share flags",
                value: bits.to_string(),
            })
    }
}

/// ActiveSync folder type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SyncType {
    Other = 1,
    Inbox = 2,
    Drafts = 3,
    WasteBasket = 4,
    SentMail = 5,
    Outbox = 6,
    Task = 7,
    Appointment = 8,
    Contact = 9,
    Note = 10,
    Journal = 11,
    UserMail = 12,
    UserAppointment = 13,
    UserContact = 14,
    UserTask = 15,
    UserJournal = 16,
    UserNote = 17,
    #[default]
    Unknown = 18,
    RecipientCache = 19,
}

impl SyncType {
    /// Type for a code sent by the server; unknown codes map to
    /// [`SyncType::Unknown`].
    pub fn from_code(code: i64) -> Self {
        use SyncType::*;
        match code {
            1 => Other,
            2 => Inbox,
            3 => Drafts,
            4 => WasteBasket,
            5 => SentMail,
            6 => Outbox,
            7 => Task,
            8 => Appointment,
            9 => Contact,
            10 => Note,
            11 => Journal,
            12 => UserMail,
            13 => UserAppointment,
            14 => UserContact,
            15 => UserTask,
            16 => UserJournal,
            17 => UserNote,
            19 => RecipientCache,
            _ => Unknown,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    /// User-created counterpart of a default folder type; a shared folder
    /// never takes the place of the sharer's default folder.
    pub fn user_type(self) -> Self {
        use SyncType::*;
        match self {
            Inbox | Drafts | WasteBasket | SentMail | Outbox | UserMail => UserMail,
            Task | UserTask => UserTask,
            Appointment | UserAppointment => UserAppointment,
            Contact | UserContact => UserContact,
            Note | UserNote => UserNote,
            Journal | UserJournal => UserJournal,
            other => other,
        }
    }

    pub fn is_mail(self) -> bool {
        self.user_type() == SyncType::UserMail
    }
}

impl SoapSerialize for SyncType {
    fn to_soap(&self) -> SoapValue {
        SoapValue::Int(self.code())
    }
}

impl SoapDeserialize for SyncType {
    fn shape() -> SoapShape {
        SoapShape::Int
    }

    fn from_soap(value: SoapValue) -> zpushsoap::Result<Self> {
        i64::from_soap(value).map(SyncType::from_code)
    }
}

/// A folder of another user's store that can be shared to this device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableFolder {
    pub server_id: SyncId,
    pub parent_id: SyncId,
    pub display_name: String,
    pub sync_type: SyncType,
    pub backend_id: BackendId,
    pub flags: ShareFlags,
}

static AVAILABLE_FOLDER_FIELDS: &[SoapField] = &[
    SoapField::new("ServerId", SyncId::shape),
    SoapField::new("ParentId", SyncId::shape),
    SoapField::new("DisplayName", String::shape),
    SoapField::new("Type", SyncType::shape),
    SoapField::new("BackendId", BackendId::shape),
    SoapField::new("Flags", ShareFlags::shape),
];

impl SoapDeserialize for AvailableFolder {
    fn shape() -> SoapShape {
        SoapShape::Record(AVAILABLE_FOLDER_FIELDS)
    }

    fn from_soap(value: SoapValue) -> zpushsoap::Result<Self> {
        let mut record = RecordReader::new(value)?;
        Ok(AvailableFolder {
            server_id: record.required("ServerId")?,
            parent_id: record
                .optional("ParentId")?
                .unwrap_or_else(SyncId::none),
            display_name: record.or_default("DisplayName")?,
            sync_type: record.or_default("Type")?,
            backend_id: record.required("BackendId")?,
            flags: record.or_default("Flags")?,
        })
    }
}

impl AvailableFolder {
    pub fn is_mail_folder(&self) -> bool {
        self.sync_type.is_mail()
    }
}

/// Access granted on a synchronised share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
}

/// A share as stored in the device's additional folder list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFolder {
    /// User owning the shared folder.
    pub store: String,
    pub folder_id: BackendId,
    pub parent_id: BackendId,
    pub name: String,
    pub sync_type: SyncType,
    pub flags: ShareFlags,
    /// Set once the folder is synchronised to the device.
    pub sync_folder_id: Option<SyncId>,
    pub origin: Option<String>,
    pub readable: bool,
    pub writeable: bool,
}

static SHARED_FOLDER_FIELDS: &[SoapField] = &[
    SoapField::new("store", String::shape),
    SoapField::new("folderid", BackendId::shape),
    SoapField::new("parentid", BackendId::shape),
    SoapField::new("name", String::shape),
    SoapField::new("type", SyncType::shape),
    SoapField::new("flags", ShareFlags::shape),
    SoapField::new("syncfolderid", SyncId::shape),
    SoapField::new("origin", String::shape),
    SoapField::new("readable", bool::shape),
    SoapField::new("writeable", bool::shape),
];

impl SoapDeserialize for SharedFolder {
    fn shape() -> SoapShape {
        SoapShape::Record(SHARED_FOLDER_FIELDS)
    }

    fn from_soap(value: SoapValue) -> zpushsoap::Result<Self> {
        let mut record = RecordReader::new(value)?;
        Ok(SharedFolder {
            store: record.required("store")?,
            folder_id: record.required("folderid")?,
            parent_id: record
                .optional("parentid")?
                .unwrap_or_else(BackendId::none),
            name: record.or_default("name")?,
            sync_type: record.or_default("type")?,
            flags: record.or_default("flags")?,
            sync_folder_id: record.optional("syncfolderid")?,
            origin: record.optional("origin")?,
            readable: record.or_default("readable")?,
            writeable: record.or_default("writeable")?,
        })
    }
}

impl SoapSerialize for SharedFolder {
    fn to_soap(&self) -> SoapValue {
        SoapValue::Map(vec![
            ("store".into(), self.store.to_soap()),
            ("folderid".into(), self.folder_id.to_soap()),
            ("parentid".into(), self.parent_id.to_soap()),
            ("name".into(), self.name.to_soap()),
            ("type".into(), self.sync_type.to_soap()),
            ("flags".into(), self.flags.to_soap()),
            ("syncfolderid".into(), self.sync_folder_id.to_soap()),
            ("origin".into(), self.origin.to_soap()),
            ("readable".into(), self.readable.to_soap()),
            ("writeable".into(), self.writeable.to_soap()),
        ])
    }
}

impl SharedFolder {
    pub fn is_synced(&self) -> bool {
        self.sync_folder_id.is_some()
    }

    /// `None` until the folder is synchronised.
    pub fn permissions(&self) -> Option<Permissions> {
        self.is_synced().then_some(Permissions {
            read: self.readable,
            write: self.writeable,
        })
    }

    pub fn can_send_as(&self) -> bool {
        self.sync_type.is_mail()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_flags(mut self, flags: ShareFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Same share from the server's point of view: only flags in
    /// [`ShareFlags::APPLY_MASK`] are compared.
    pub fn same_share(&self, other: &SharedFolder) -> bool {
        self.store == other.store
            && self.folder_id == other.folder_id
            && self.parent_id == other.parent_id
            && self.name == other.name
            && self.sync_type == other.sync_type
            && self.flags.masked(ShareFlags::APPLY_MASK)
                == other.flags.masked(ShareFlags::APPLY_MASK)
    }
}

/// Folders of `user` that are available for sharing (info service).
#[derive(Debug, Clone)]
pub struct ListUserFoldersRequest {
    pub user: String,
}

impl ListUserFoldersRequest {
    pub fn new(user: impl Into<String>) -> Self {
        ListUserFoldersRequest { user: user.into() }
    }
}

impl SoapRequest for ListUserFoldersRequest {
    type Response = Vec<AvailableFolder>;

    fn user_name(&self) -> Option<&str> {
        Some(&self.user)
    }
}

/// Current shares of this device (device service).
#[derive(Debug, Clone, Copy, Default)]
pub struct AdditionalFolderListRequest;

impl SoapRequest for AdditionalFolderListRequest {
    type Response = Vec<SharedFolder>;
}

/// Replaces the shares of `store` on this device (device service).
#[derive(Debug, Clone)]
pub struct AdditionalFolderSetListRequest {
    pub store: String,
    pub folders: Vec<SharedFolder>,
}

impl AdditionalFolderSetListRequest {
    pub fn new(store: impl Into<String>, folders: Vec<SharedFolder>) -> Self {
        AdditionalFolderSetListRequest {
            store: store.into(),
            folders,
        }
    }
}

impl SoapRequest for AdditionalFolderSetListRequest {
    type Response = bool;

    fn parameters(&self) -> SoapParameters {
        SoapParameters::new()
            .with("store", self.store.as_str())
            .with("folders", self.folders.to_soap())
    }
}

/// Available folders of one store arranged by parent.
#[derive(Debug, Clone)]
pub struct FolderTree {
    store: String,
    folders: Vec<AvailableFolder>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl FolderTree {
    /// Links every folder to its parent. A parent id that is not in the
    /// list, or a loop of parents, is an error.
    pub fn build(store: impl Into<String>, folders: Vec<AvailableFolder>) -> Result<Self> {
        let index: HashMap<&SyncId, usize> = folders
            .iter()
            .enumerate()
            .map(|(i, f)| (&f.server_id, i))
            .collect();

        let mut parents = vec![None; folders.len()];
        let mut children = vec![Vec::new(); folders.len()];
        let mut roots = Vec::new();
        for (i, folder) in folders.iter().enumerate() {
            if folder.parent_id.is_none() {
                roots.push(i);
                continue;
            }
            let parent = *index.get(&folder.parent_id).ok_or_else(|| {
                ConnectError::response(format!("missing parent folder: {}", folder.parent_id))
            })?;
            parents[i] = Some(parent);
            children[parent].push(i);
        }

        let mut reached = 0;
        let mut stack = roots.clone();
        while let Some(i) = stack.pop() {
            reached += 1;
            stack.extend(&children[i]);
        }
        if reached != folders.len() {
            return Err(ConnectError::response("folder hierarchy contains a cycle"));
        }

        Ok(FolderTree {
            store: store.into(),
            folders,
            parents,
            children,
            roots,
        })
    }

    pub fn store(&self) -> &str {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn roots(&self) -> impl Iterator<Item = FolderNode<'_>> {
        self.roots.iter().map(|&index| FolderNode { tree: self, index })
    }

    pub fn get(&self, id: &SyncId) -> Option<FolderNode<'_>> {
        self.folders
            .iter()
            .position(|f| f.server_id == *id)
            .map(|index| FolderNode { tree: self, index })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FolderNode<'a> {
    tree: &'a FolderTree,
    index: usize,
}

impl<'a> FolderNode<'a> {
    pub fn folder(&self) -> &'a AvailableFolder {
        &self.tree.folders[self.index]
    }

    pub fn parent(&self) -> Option<FolderNode<'a>> {
        self.tree.parents[self.index].map(|index| FolderNode {
            tree: self.tree,
            index,
        })
    }

    pub fn children(&self) -> impl Iterator<Item = FolderNode<'a>> + 'a {
        let tree = self.tree;
        tree.children[self.index]
            .iter()
            .map(move |&index| FolderNode { tree, index })
    }

    /// New share of this folder under `name`. Mail folders are sent as
    /// the owner by default.
    pub fn share(&self, name: impl Into<String>) -> SharedFolder {
        let folder = self.folder();
        let parent_id = self
            .parent()
            .map(|p| p.folder().backend_id.clone())
            .unwrap_or_else(BackendId::none);
        SharedFolder {
            store: self.tree.store.clone(),
            folder_id: folder.backend_id.clone(),
            parent_id,
            name: name.into(),
            sync_type: folder.sync_type.user_type(),
            flags: if folder.is_mail_folder() {
                ShareFlags::SEND_AS_OWNER
            } else {
                ShareFlags::NONE
            },
            sync_folder_id: None,
            origin: None,
            readable: false,
            writeable: false,
        }
    }
}
