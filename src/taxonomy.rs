//! The fixed destination taxonomy.
//!
//! Each folder carries a numeric prefix and its name is used verbatim as a
//! path segment under the destination root.
//!
//! # Examples
//!
//! ```
//! use archsort::taxonomy::Folder;
//!
//! assert_eq!(Folder::BoardMeetings.dir_name(), "021 Styremøter");
//! assert_eq!(Folder::ALL.first(), Some(&Folder::Statutes));
//! ```

use std::path::PathBuf;

/// Subfolder of [`Folder::Statutes`] for superseded or dated statutes.
pub const STATUTES_HISTORY: &str = "X00 Historikk";

/// Subfolder of [`Folder::BoardMeetings`] for minutes without a usable date.
pub const UNSORTED_MEETINGS: &str = "_usortert";

/// Subfolder of a yearly assembly folder for extraordinary assemblies.
pub const EXTRAORDINARY_ASSEMBLY: &str = "Ekstraordinær";

/// A top-level destination folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Folder {
    /// Statutes and governance documents.
    Statutes,
    /// General assemblies, one subfolder per year.
    GeneralAssembly,
    /// Board meetings, one subfolder per dated meeting.
    BoardMeetings,
    /// Spring letters and member communication.
    MemberLetters,
    /// Agreements and instructions.
    Agreements,
    /// The joint board shared with neighbouring islands.
    JointBoard,
    /// Waste collection.
    WasteCollection,
    /// Stewardship and environment.
    Stewardship,
    /// Correspondence with the state property agency.
    StateProperty,
    /// Caretaker cabin renovation project.
    CaretakerCabin,
    /// Land redemption project.
    LandRedemption,
    /// Illegal construction follow-up project.
    IllegalConstruction,
    /// VAT refund project.
    VatRefund,
}

impl Folder {
    /// Every folder, in taxonomy order.
    pub const ALL: [Folder; 13] = [
        Folder::Statutes,
        Folder::GeneralAssembly,
        Folder::BoardMeetings,
        Folder::MemberLetters,
        Folder::Agreements,
        Folder::JointBoard,
        Folder::WasteCollection,
        Folder::Stewardship,
        Folder::StateProperty,
        Folder::CaretakerCabin,
        Folder::LandRedemption,
        Folder::IllegalConstruction,
        Folder::VatRefund,
    ];

    /// Returns the folder name as it appears on disk.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Folder::Statutes => "000 Vedtekter og styringsdokumenter",
            Folder::GeneralAssembly => "010 Generalforsamling",
            Folder::BoardMeetings => "021 Styremøter",
            Folder::MemberLetters => "024 Vårbrev og medlemskommunikasjon",
            Folder::Agreements => "070 Avtaler og instruks",
            Folder::JointBoard => "090 Fellesstyret",
            Folder::WasteCollection => "230 Renovasjon",
            Folder::Stewardship => "250 Skjøtsel og miljø",
            Folder::StateProperty => "310 Statsbygg",
            Folder::CaretakerCabin => "500 2016 Renovering vaktmesterhytta",
            Folder::LandRedemption => "500 2020-2024 Tomteinnløsning",
            Folder::IllegalConstruction => "500 2020-2025 Ulovlighetsoppfølging brygger",
            Folder::VatRefund => "502 2024 MVA-refusjon",
        }
    }

    /// Path of this folder relative to the destination root.
    pub fn path(&self) -> PathBuf {
        PathBuf::from(self.dir_name())
    }

    /// Path of the yearly general assembly folder, e.g. `2024 Generalforsamling`.
    pub fn assembly_year(year: u32) -> PathBuf {
        Folder::GeneralAssembly
            .path()
            .join(format!("{year} Generalforsamling"))
    }
}
