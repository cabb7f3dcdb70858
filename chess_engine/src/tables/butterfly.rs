
use std::ops::{Index, IndexMut};

use chess_core::core::masks::*;
use chess_core::{BitMove, Player};

use super::{StatBoard, NumStatBoard};

/// ButterflyBoards are 2 tables (one for each color) indexed by the move's from
/// and to squares, see chessprogramming.wikispaces.com/Butterfly+Boards
pub struct ButterflyHistory {
    a: [[i16; (SQ_CNT * SQ_CNT)]; PLAYER_CNT]
}

// [Us][From * SQ_CNT + To]
type BF_idx = (Player, BitMove);

impl Index<BF_idx> for ButterflyHistory {
    type Output = i16;

    #[inline(always)]
    fn index(&self, idx: BF_idx) -> &Self::Output {
        let mov = idx.1;
        let from_to = (mov.get_src().0 as usize) * SQ_CNT + mov.get_dest().0 as usize;
        unsafe {
            self.a
                .get_unchecked(idx.0 as usize)
                .get_unchecked(from_to)
        }
    }
}

impl IndexMut<BF_idx> for ButterflyHistory {
    #[inline(always)]
    fn index_mut(&mut self, idx: BF_idx) -> &mut Self::Output {
        let mov = idx.1;
        let from_to = (mov.get_src().0 as usize) * SQ_CNT + mov.get_dest().0 as usize;
        unsafe {
            self.a
                .get_unchecked_mut(idx.0 as usize)
                .get_unchecked_mut(from_to)
        }
    }
}

impl StatBoard<i16> for ButterflyHistory {
    const FILL: i16 = 0;
}

impl NumStatBoard for ButterflyHistory {
    const D: i16 = 324;
}