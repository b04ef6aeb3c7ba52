use std::fmt;

/// Main error type for the dungeon server core.
///
/// Every error is scoped to a single player's session or connection; none
/// is fatal to the process. `code()` yields the wire error code carried by
/// outbound `ERROR` messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Authentication failure on the connection
    Auth(AuthError),
    /// Species catalog / upstream provider failure
    Catalog(CatalogError),
    /// Owned-creature store failure
    Store(StoreError),
    /// Wild-encounter lookup or generation failure
    Encounter(EncounterError),
    /// Dungeon-run lifecycle violation
    Session(SessionError),
    /// Invalid battle input
    Battle(BattleError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token was supplied with AUTHENTICATE
    MissingToken,
    /// The supplied token did not verify
    InvalidToken,
    /// A gameplay message arrived before authentication
    NotAuthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The provider could not serve the species record
    SpeciesUnavailable(u16),
    /// The provider could not serve a zone's species pool
    PoolUnavailable(u16),
    /// The provider answered with data we could not use
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No owned creature with that id for this player
    CreatureNotFound(String),
    /// The backing store could not be reached
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncounterError {
    /// The zone's species pool is empty
    EmptySpeciesPool(u16),
    /// The player has no pending wild encounter
    NoPendingEncounter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A dungeon team must contain exactly 4 creatures
    InvalidTeamSize(usize),
    /// A selected creature does not belong to the player
    UnownedCreature(String),
    /// Unknown or inactive dungeon id
    DungeonNotFound(u32),
    /// The player has no active dungeon session
    NoActiveSession,
    /// Every opponent in the run is already defeated
    AllOpponentsDefeated,
    /// The chosen creature was knocked out earlier this run
    KnockedOutSelection(String),
    /// The chosen creature is not part of the selected team
    NotInTeam(String),
    /// No battle is in progress for this session
    NoBattleInProgress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleError {
    /// Move slot index out of range for the acting combatant
    InvalidMoveSlot(usize),
    /// The chosen move has no PP left
    MoveExhausted(usize),
}

impl GameError {
    /// Wire error code for outbound ERROR messages.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::Auth(AuthError::MissingToken) => "MISSING_TOKEN",
            GameError::Auth(AuthError::InvalidToken) => "INVALID_TOKEN",
            GameError::Auth(AuthError::NotAuthenticated) => "UNAUTHORIZED",
            GameError::Catalog(_) => "UPSTREAM_UNAVAILABLE",
            GameError::Store(StoreError::CreatureNotFound(_)) => "POKEMON_NOT_FOUND",
            GameError::Store(StoreError::Unavailable(_)) => "UPSTREAM_UNAVAILABLE",
            GameError::Encounter(EncounterError::EmptySpeciesPool(_)) => "ZONE_EMPTY",
            GameError::Encounter(EncounterError::NoPendingEncounter) => "NO_WILD_POKEMON",
            GameError::Session(SessionError::InvalidTeamSize(_)) => "INVALID_TEAM_SIZE",
            GameError::Session(SessionError::UnownedCreature(_)) => "POKEMON_NOT_OWNED",
            GameError::Session(SessionError::DungeonNotFound(_)) => "DUNGEON_NOT_AVAILABLE",
            GameError::Session(SessionError::NoActiveSession) => "NO_ACTIVE_SESSION",
            GameError::Session(SessionError::AllOpponentsDefeated) => "DUNGEON_COMPLETED",
            GameError::Session(SessionError::KnockedOutSelection(_)) => "INVALID_SELECTION",
            GameError::Session(SessionError::NotInTeam(_)) => "POKEMON_NOT_AVAILABLE",
            GameError::Session(SessionError::NoBattleInProgress) => "NO_ACTIVE_BATTLE",
            GameError::Battle(_) => "INVALID_MOVE",
        }
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::Auth(err) => write!(f, "auth error: {}", err),
            GameError::Catalog(err) => write!(f, "catalog error: {}", err),
            GameError::Store(err) => write!(f, "store error: {}", err),
            GameError::Encounter(err) => write!(f, "encounter error: {}", err),
            GameError::Session(err) => write!(f, "session error: {}", err),
            GameError::Battle(err) => write!(f, "battle error: {}", err),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "token required"),
            AuthError::InvalidToken => write!(f, "token did not verify"),
            AuthError::NotAuthenticated => write!(f, "not authenticated"),
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::SpeciesUnavailable(id) => {
                write!(f, "species {} unavailable from provider", id)
            }
            CatalogError::PoolUnavailable(zone) => {
                write!(f, "species pool for zone {} unavailable", zone)
            }
            CatalogError::Malformed(details) => write!(f, "malformed catalog data: {}", details),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::CreatureNotFound(id) => write!(f, "no owned creature {}", id),
            StoreError::Unavailable(details) => write!(f, "store unavailable: {}", details),
        }
    }
}

impl fmt::Display for EncounterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncounterError::EmptySpeciesPool(zone) => {
                write!(f, "no species in zone {}", zone)
            }
            EncounterError::NoPendingEncounter => write!(f, "no pending wild encounter"),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidTeamSize(n) => {
                write!(f, "exactly 4 creatures required, got {}", n)
            }
            SessionError::UnownedCreature(id) => write!(f, "creature {} not owned", id),
            SessionError::DungeonNotFound(id) => write!(f, "dungeon {} not found", id),
            SessionError::NoActiveSession => write!(f, "no active dungeon session"),
            SessionError::AllOpponentsDefeated => {
                write!(f, "all opponents already defeated")
            }
            SessionError::KnockedOutSelection(id) => {
                write!(f, "creature {} was knocked out this run", id)
            }
            SessionError::NotInTeam(id) => write!(f, "creature {} not in selected team", id),
            SessionError::NoBattleInProgress => write!(f, "no battle in progress"),
        }
    }
}

impl fmt::Display for BattleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleError::InvalidMoveSlot(slot) => write!(f, "invalid move slot {}", slot),
            BattleError::MoveExhausted(slot) => {
                write!(f, "move in slot {} has no PP left", slot)
            }
        }
    }
}

impl std::error::Error for GameError {}
impl std::error::Error for AuthError {}
impl std::error::Error for CatalogError {}
impl std::error::Error for StoreError {}
impl std::error::Error for EncounterError {}
impl std::error::Error for SessionError {}
impl std::error::Error for BattleError {}

impl From<AuthError> for GameError {
    fn from(err: AuthError) -> Self {
        GameError::Auth(err)
    }
}

impl From<CatalogError> for GameError {
    fn from(err: CatalogError) -> Self {
        GameError::Catalog(err)
    }
}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        GameError::Store(err)
    }
}

impl From<EncounterError> for GameError {
    fn from(err: EncounterError) -> Self {
        GameError::Encounter(err)
    }
}

impl From<SessionError> for GameError {
    fn from(err: SessionError) -> Self {
        GameError::Session(err)
    }
}

impl From<BattleError> for GameError {
    fn from(err: BattleError) -> Self {
        GameError::Battle(err)
    }
}

/// Type alias for Results using GameError
pub type GameResult<T> = Result<T, GameError>;

/// Type alias for Results using CatalogError
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Type alias for Results using StoreError
pub type StoreResult<T> = Result<T, StoreError>;
