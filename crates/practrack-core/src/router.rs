// ── Route table ──
//
//   /{entity}               list
//   /{entity}/new           create form
//   /{entity}/{id}          detail
//   /{entity}/{id}/edit     edit form
//   /{entity}/{id}/delete   delete dialog
//
// `{entity}` is `practice-session` or `practice`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::{EntityId, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    List(EntityKind),
    New(EntityKind),
    Detail(EntityKind, EntityId),
    Edit(EntityKind, EntityId),
    Delete(EntityKind, EntityId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),
    #[error("invalid id '{0}'")]
    InvalidId(String),
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("no route matches '{0}'")]
    NoMatch(String),
}

impl Route {
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let trimmed = path.strip_suffix('/').unwrap_or(path);
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Err(RouteError::NoMatch(path.to_owned()));
        };
        let segments: Vec<&str> = rest.split('/').collect();

        let (entity, tail) = match segments.split_first() {
            Some((entity, tail)) if !entity.is_empty() => (*entity, tail),
            _ => return Err(RouteError::NoMatch(path.to_owned())),
        };
        let kind: EntityKind = entity
            .parse()
            .map_err(|_| RouteError::UnknownEntity(entity.to_owned()))?;

        match tail {
            [] => Ok(Self::List(kind)),
            ["new"] => Ok(Self::New(kind)),
            [id] => Ok(Self::Detail(kind, parse_id(id)?)),
            [id, "edit"] => Ok(Self::Edit(kind, parse_id(id)?)),
            [id, "delete"] => Ok(Self::Delete(kind, parse_id(id)?)),
            [_, action] => Err(RouteError::UnknownAction((*action).to_owned())),
            _ => Err(RouteError::NoMatch(path.to_owned())),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match *self {
            Self::List(kind)
            | Self::New(kind)
            | Self::Detail(kind, _)
            | Self::Edit(kind, _)
            | Self::Delete(kind, _) => kind,
        }
    }

    pub fn id(&self) -> Option<EntityId> {
        match *self {
            Self::List(_) | Self::New(_) => None,
            Self::Detail(_, id) | Self::Edit(_, id) | Self::Delete(_, id) => Some(id),
        }
    }

    pub fn path(&self) -> String {
        self.to_string()
    }

    /// The list route for the same entity.
    pub fn list(&self) -> Self {
        Self::List(self.kind())
    }
}

fn parse_id(raw: &str) -> Result<EntityId, RouteError> {
    raw.parse()
        .map_err(|_| RouteError::InvalidId(raw.to_owned()))
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seg = self.kind().segment();
        match self {
            Self::List(_) => write!(f, "/{seg}"),
            Self::New(_) => write!(f, "/{seg}/new"),
            Self::Detail(_, id) => write!(f, "/{seg}/{id}"),
            Self::Edit(_, id) => write!(f, "/{seg}/{id}/edit"),
            Self::Delete(_, id) => write!(f, "/{seg}/{id}/delete"),
        }
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
