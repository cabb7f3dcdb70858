use std::ops::{Index, IndexMut};

use chess_core::core::masks::*;
use chess_core::{Piece, PieceType, SQ};

use super::{StatBoard,NumStatCube};

/// CapturePieceToBoards are addressed by a move's[player][piece][to][captured piece] information
pub struct CapturePieceToHistory {
    a: [[[[i16; PIECE_TYPE_CNT]; SQ_CNT]; PIECE_TYPE_CNT]; PLAYER_CNT]
}

// [player][piece moved][to][captured piece type]
type CPT_idx = (Piece, SQ, PieceType);

impl Index<CPT_idx> for CapturePieceToHistory {
    type Output = i16;

    #[inline(always)]
    fn index(&self, idx: CPT_idx) -> &Self::Output {
        let (player, piece_type) = idx.0.player_piece_lossy();
        unsafe {
            self.a
                .get_unchecked(player as usize)
                .get_unchecked(piece_type as usize)
                .get_unchecked((idx.1).0 as usize)
                .get_unchecked(idx.2 as usize)
        }
    }
}

impl IndexMut<CPT_idx> for CapturePieceToHistory {
    #[inline(always)]
    fn index_mut(&mut self, idx: CPT_idx) -> &mut Self::Output {
        let (player, piece_type) = idx.0.player_piece_lossy();
        unsafe {
            self.a
                .get_unchecked_mut(player as usize)
                .get_unchecked_mut(piece_type as usize)
                .get_unchecked_mut((idx.1).0 as usize)
                .get_unchecked_mut(idx.2 as usize)
        }
    }
}

impl StatBoard<i16> for CapturePieceToHistory {
    const FILL: i16 = 0;
}

impl NumStatCube for CapturePieceToHistory {
    const D: i16 = 324;
    const W: i16 = 2;
}
