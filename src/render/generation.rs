use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::render::Framebuffer;

/// Jeton d'un rendu, obtenu par [`FrameGate::begin`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RenderTicket(u64);

/// Compteur de générations partagé entre la vue et le moteur de rendu.
///
/// Chaque rendu prend un jeton ; seule l'image du jeton le plus récent est
/// acceptée à l'affichage. Les clones partagent le même compteur.
#[derive(Clone, Debug, Default)]
pub struct FrameGate {
    latest: Arc<AtomicU64>,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RenderTicket {
        RenderTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Rend l'image si son jeton est toujours le plus récent, sinon la jette.
    pub fn commit(&self, ticket: RenderTicket, frame: Framebuffer) -> Option<Framebuffer> {
        if self.is_current(ticket) {
            Some(frame)
        } else {
            log::debug!(
                "image de la génération {} ignorée (courante: {})",
                ticket.0,
                self.latest.load(Ordering::SeqCst)
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_increase() {
        let gate = FrameGate::new();
        let a = gate.begin();
        let b = gate.begin();
        assert!(b > a);
        assert!(!gate.is_current(a));
        assert!(gate.is_current(b));
    }

    #[test]
    fn stale_frames_are_discarded() {
        let gate = FrameGate::new();
        let old = gate.begin();
        let new = gate.begin();
        assert_eq!(gate.commit(old, Framebuffer::new(1, 1)), None);
        assert!(gate.commit(new, Framebuffer::new(1, 1)).is_some());
    }

    #[test]
    fn clones_share_the_counter() {
        let gate = FrameGate::new();
        let view = gate.clone();
        let ticket = gate.begin();
        view.begin();
        assert!(!gate.is_current(ticket));
    }
}
